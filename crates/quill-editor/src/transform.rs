use quill_types::TransformKind;

use crate::cancel::Ticket;
use crate::history::History;
use crate::surface::{EditableSurface, TextRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformScope {
    Selection,
    Document,
}

/// A transformation that has been validated and is waiting on the AI service.
///
/// Hosts that run the network call themselves send [`input`](Self::input)
/// with [`kind`](Self::kind) and hand the result back to
/// `Editor::finish_transform`.
#[derive(Debug)]
pub struct PendingTransform {
    pub(crate) ticket: Ticket,
    pub(crate) kind: TransformKind,
    pub(crate) scope: TransformScope,
    pub(crate) input: String,
    pub(crate) range: TextRange,
    pub(crate) revision: u64,
}

impl PendingTransform {
    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    pub fn scope(&self) -> TransformScope {
        self.scope
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Range the transformation will replace.
    pub fn range(&self) -> TextRange {
        self.range
    }
}

/// Replace `range` with `text` as one undoable step and leave the cursor
/// after the inserted text. Returns that cursor offset.
pub fn splice<S>(surface: &mut S, history: &mut History, range: TextRange, text: &str) -> usize
where
    S: EditableSurface + ?Sized,
{
    history.record_before_change(surface.content());
    surface.delete_range(range);
    let end = surface.insert_text_at(range.start, text);
    surface.collapse_cursor_to(end);
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MemorySurface;

    #[test]
    fn splice_replaces_only_the_range() {
        let mut surface = MemorySurface::new("<p>the cat sat on the mat</p>");
        let mut history = History::default();
        assert!(surface.select_text("the cat sat"));
        let range = surface.selection().unwrap().range;

        let end = splice(&mut surface, &mut history, range, "the cat sits");

        assert_eq!(surface.markup(), "<p>the cat sits on the mat</p>");
        assert_eq!(history.undo_depth(), 1);
        assert!(!history.can_redo());

        let caret = surface.selection().unwrap();
        assert!(caret.range.is_empty());
        assert_eq!(caret.range.start, end);
        assert_eq!(end, 3 + "the cat sits".len());
    }

    #[test]
    fn spliced_text_is_never_markup() {
        let mut surface = MemorySurface::new("<p>x</p>");
        let mut history = History::default();
        let range = TextRange::new(3, 4);

        splice(&mut surface, &mut history, range, "<b>bold</b>\nnext");

        assert_eq!(surface.markup(), "<p>&lt;b&gt;bold&lt;/b&gt;<br>next</p>");
        assert_eq!(history.undo("ignored").as_deref(), Some("<p>x</p>"));
    }

    #[test]
    fn splice_across_an_element_edge_keeps_markup_balanced() {
        let mut surface = MemorySurface::new("<p>the <b>cat</b> sat</p>");
        let mut history = History::default();
        assert!(surface.select(TextRange::new(10, 21)));
        let range = surface.selection().unwrap().range;

        let end = splice(&mut surface, &mut history, range, "dog rests");

        assert_eq!(surface.markup(), "<p>the <b>dog rests</b></p>");
        assert_eq!(end, 10 + "dog rests".len());
        assert_eq!(
            history.undo("ignored").as_deref(),
            Some("<p>the <b>cat</b> sat</p>")
        );
    }
}
