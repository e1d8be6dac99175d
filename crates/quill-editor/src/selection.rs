use tracing::trace;

use crate::surface::{EditableSurface, TextRange};

/// Text the user had highlighted, and where, at a given surface revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSnapshot {
    pub text: String,
    pub range: TextRange,
    pub revision: u64,
}

/// Follows the host selection and keeps it only while it is a real,
/// non-blank highlight inside the editing region.
#[derive(Debug, Default)]
pub struct SelectionTracker {
    current: Option<SelectionSnapshot>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a selection-change notification.
    pub fn observe<S>(&mut self, surface: &S, revision: u64) -> Option<&SelectionSnapshot>
    where
        S: EditableSurface + ?Sized,
    {
        self.current = surface
            .selection()
            .filter(|sel| sel.within_region && !sel.range.is_empty())
            .filter(|sel| !sel.text.trim().is_empty())
            .map(|sel| SelectionSnapshot {
                text: sel.text,
                range: sel.range,
                revision,
            });

        trace!(tracked = self.current.is_some(), revision, "Selection changed");
        self.current.as_ref()
    }

    pub fn current(&self) -> Option<&SelectionSnapshot> {
        self.current.as_ref()
    }

    /// The snapshot, provided the document has not changed since it was taken.
    pub fn valid_at(&self, revision: u64) -> Option<&SelectionSnapshot> {
        self.current.as_ref().filter(|snap| snap.revision == revision)
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MemorySurface;

    #[test]
    fn tracks_selections_inside_the_region() {
        let mut surface = MemorySurface::new("<p>the cat sat</p>");
        let mut tracker = SelectionTracker::new();

        surface.select_text("cat sat");
        let snap = tracker.observe(&surface, 1).unwrap();
        assert_eq!(snap.text, "cat sat");
        assert_eq!(snap.range, TextRange::new(7, 14));
    }

    #[test]
    fn collapsed_or_blank_selections_clear_the_value() {
        let mut surface = MemorySurface::new("<p>a   b</p>");
        let mut tracker = SelectionTracker::new();

        surface.select_text("a");
        assert!(tracker.observe(&surface, 0).is_some());

        surface.collapse_cursor_to(4);
        assert!(tracker.observe(&surface, 0).is_none());

        surface.select_text("   ");
        assert!(tracker.observe(&surface, 0).is_none());
    }

    #[test]
    fn selections_outside_the_region_are_ignored() {
        let mut surface = MemorySurface::new("<p>body</p>");
        let mut tracker = SelectionTracker::new();

        surface.select_text("body");
        tracker.observe(&surface, 0);
        surface.select_outside_region("Document title");
        assert!(tracker.observe(&surface, 0).is_none());
        assert!(tracker.current().is_none());
    }

    #[test]
    fn snapshots_expire_with_the_revision() {
        let mut surface = MemorySurface::new("<p>body</p>");
        let mut tracker = SelectionTracker::new();

        surface.select_text("body");
        tracker.observe(&surface, 3);
        assert!(tracker.valid_at(3).is_some());
        assert!(tracker.valid_at(4).is_none());
    }
}
