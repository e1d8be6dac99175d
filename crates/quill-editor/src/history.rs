/// Linear undo/redo over whole-document snapshots.
///
/// Snapshots are full serialized content, never diffs. Documents are short
/// text, so the copies stay small.
#[derive(Debug, Default)]
pub struct History {
    undo_stack: Vec<String>,
    redo_stack: Vec<String>,
    /// Maximum undo depth; the oldest snapshots are dropped first.
    limit: Option<usize>,
}

impl History {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit,
        }
    }

    /// Call right before a mutating operation with the content it is about
    /// to replace. Invalidates the redo stack.
    pub fn record_before_change(&mut self, current: impl Into<String>) {
        self.redo_stack.clear();
        self.undo_stack.push(current.into());

        if let Some(limit) = self.limit {
            let excess = self.undo_stack.len().saturating_sub(limit);
            if excess > 0 {
                self.undo_stack.drain(..excess);
            }
        }
    }

    /// Returns the content to restore, or `None` if there is nothing to undo.
    pub fn undo(&mut self, current: &str) -> Option<String> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current.to_string());
        Some(previous)
    }

    /// Mirror of [`History::undo`].
    pub fn redo(&mut self, current: &str) -> Option<String> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current.to_string());
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
