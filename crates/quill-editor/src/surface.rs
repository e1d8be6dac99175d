//! The editing surface capability and an in-memory implementation of it.
//!
//! The core never touches a rendering surface directly. Everything it needs
//! (reading the live selection, deleting a range, inserting text, moving the
//! cursor) goes through [`EditableSurface`], so the same logic drives a
//! browser bridge, a terminal front end, or [`MemorySurface`] in tests.

use crate::markup::{self, escape_attr};

/// A span of the surface, in surface-defined offsets. For [`MemorySurface`]
/// these are byte offsets into the markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

/// The host's active selection as reported by the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceSelection {
    pub range: TextRange,
    /// Visible text covered by the selection.
    pub text: String,
    /// False when the selection lives outside the managed editing region,
    /// e.g. in a title field or elsewhere on the page.
    pub within_region: bool,
}

/// Native formatting commands of an editable region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    StrikeThrough,
    JustifyLeft,
    JustifyCenter,
    JustifyRight,
    InsertUnorderedList,
    InsertOrderedList,
    ForeColor(String),
    HiliteColor(String),
    CreateLink(String),
    Unlink,
}

impl FormatCommand {
    /// Command name understood by browser `execCommand`.
    pub fn command_name(&self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::StrikeThrough => "strikeThrough",
            Self::JustifyLeft => "justifyLeft",
            Self::JustifyCenter => "justifyCenter",
            Self::JustifyRight => "justifyRight",
            Self::InsertUnorderedList => "insertUnorderedList",
            Self::InsertOrderedList => "insertOrderedList",
            Self::ForeColor(_) => "foreColor",
            Self::HiliteColor(_) => "hiliteColor",
            Self::CreateLink(_) => "createLink",
            Self::Unlink => "unlink",
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Self::ForeColor(v) | Self::HiliteColor(v) | Self::CreateLink(v) => Some(v),
            _ => None,
        }
    }
}

pub trait EditableSurface {
    /// Serialized content of the whole editing region.
    fn content(&self) -> String;

    /// Replace the whole region with `markup`. Clears the selection.
    fn set_content(&mut self, markup: &str);

    /// Visible text of the whole region.
    fn plain_text(&self) -> String;

    /// Range covering the whole region.
    fn full_range(&self) -> TextRange;

    /// The active selection, if the host has one.
    fn selection(&self) -> Option<SurfaceSelection>;

    fn delete_range(&mut self, range: TextRange);

    /// Insert `text` as plain text at `offset`, never as markup. Returns the
    /// offset just past the inserted content.
    fn insert_text_at(&mut self, offset: usize, text: &str) -> usize;

    fn collapse_cursor_to(&mut self, offset: usize);

    /// Run a formatting command against the active selection. Returns false
    /// if nothing changed.
    fn exec_format(&mut self, command: &FormatCommand) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ActiveSelection {
    Inside(TextRange),
    Outside(String),
}

/// Editing surface backed by a markup string.
///
/// Selections are byte ranges into the markup and may not start or end
/// inside a tag. A selection may cross element boundaries. Deleting it keeps
/// the tags of elements reaching outside the range, so the markup stays
/// balanced.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    markup: String,
    selection: Option<ActiveSelection>,
}

impl MemorySurface {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            selection: None,
        }
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Select a byte range of the markup. Rejects ranges that are out of
    /// bounds, split a character, or cut through a tag.
    pub fn select(&mut self, range: TextRange) -> bool {
        if !self.is_valid_offset(range.start) || !self.is_valid_offset(range.end) {
            return false;
        }
        self.selection = Some(ActiveSelection::Inside(range));
        true
    }

    /// Select the first occurrence of `needle` that sits outside tags.
    pub fn select_text(&mut self, needle: &str) -> bool {
        if needle.is_empty() {
            return false;
        }
        let found = self
            .markup
            .match_indices(needle)
            .map(|(start, _)| TextRange::new(start, start + needle.len()))
            .find(|r| self.is_valid_offset(r.start) && self.is_valid_offset(r.end));

        match found {
            Some(range) => self.select(range),
            None => false,
        }
    }

    pub fn select_all(&mut self) {
        self.selection = Some(ActiveSelection::Inside(self.full_range()));
    }

    /// Simulate the user highlighting `text` somewhere outside the region.
    pub fn select_outside_region(&mut self, text: impl Into<String>) {
        self.selection = Some(ActiveSelection::Outside(text.into()));
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Simulate typing: insert raw markup at the caret, or at the end when
    /// there is no caret in the region. The caret ends up after the input.
    pub fn type_markup(&mut self, input: &str) {
        let at = match &self.selection {
            Some(ActiveSelection::Inside(range)) => {
                let range = *range;
                self.remove(range);
                range.start
            }
            _ => self.markup.len(),
        };
        self.markup.insert_str(at, input);
        self.selection = Some(ActiveSelection::Inside(TextRange::caret(at + input.len())));
    }

    fn is_valid_offset(&self, offset: usize) -> bool {
        offset <= self.markup.len()
            && self.markup.is_char_boundary(offset)
            && !markup::is_inside_tag(&self.markup, offset)
    }

    /// Remove the content of `range`, keeping boundary tags.
    fn remove(&mut self, range: TextRange) {
        let kept = markup::boundary_tags(&self.markup[range.start..range.end]);
        self.markup.replace_range(range.start..range.end, &kept);
    }

    fn active_range(&self) -> Option<TextRange> {
        match &self.selection {
            Some(ActiveSelection::Inside(range)) if !range.is_empty() => Some(*range),
            _ => None,
        }
    }
}

impl EditableSurface for MemorySurface {
    fn content(&self) -> String {
        self.markup.clone()
    }

    fn set_content(&mut self, markup: &str) {
        self.markup = markup.to_string();
        self.selection = None;
    }

    fn plain_text(&self) -> String {
        markup::markup_to_text(&self.markup)
    }

    fn full_range(&self) -> TextRange {
        TextRange::new(0, self.markup.len())
    }

    fn selection(&self) -> Option<SurfaceSelection> {
        match self.selection.as_ref()? {
            ActiveSelection::Inside(range) => Some(SurfaceSelection {
                range: *range,
                text: markup::markup_to_text(&self.markup[range.start..range.end]),
                within_region: true,
            }),
            ActiveSelection::Outside(text) => Some(SurfaceSelection {
                range: TextRange::caret(0),
                text: text.clone(),
                within_region: false,
            }),
        }
    }

    fn delete_range(&mut self, range: TextRange) {
        let end = range.end.min(self.markup.len());
        let start = range.start.min(end);
        self.remove(TextRange::new(start, end));
        self.selection = Some(ActiveSelection::Inside(TextRange::caret(start)));
    }

    fn insert_text_at(&mut self, offset: usize, text: &str) -> usize {
        let offset = offset.min(self.markup.len());
        debug_assert!(self.markup.is_char_boundary(offset));
        let escaped = markup::text_to_markup(text);
        self.markup.insert_str(offset, &escaped);
        offset + escaped.len()
    }

    fn collapse_cursor_to(&mut self, offset: usize) {
        self.selection = Some(ActiveSelection::Inside(TextRange::caret(
            offset.min(self.markup.len()),
        )));
    }

    fn exec_format(&mut self, command: &FormatCommand) -> bool {
        let Some(range) = self.active_range() else {
            return false;
        };
        let inner = &self.markup[range.start..range.end];

        let replacement = match command {
            FormatCommand::Bold => wrap("b", "", inner),
            FormatCommand::Italic => wrap("i", "", inner),
            FormatCommand::Underline => wrap("u", "", inner),
            FormatCommand::StrikeThrough => wrap("s", "", inner),
            FormatCommand::JustifyLeft => wrap("div", " style=\"text-align: left\"", inner),
            FormatCommand::JustifyCenter => wrap("div", " style=\"text-align: center\"", inner),
            FormatCommand::JustifyRight => wrap("div", " style=\"text-align: right\"", inner),
            FormatCommand::InsertUnorderedList => format!("<ul><li>{}</li></ul>", inner),
            FormatCommand::InsertOrderedList => format!("<ol><li>{}</li></ol>", inner),
            FormatCommand::ForeColor(color) => wrap(
                "span",
                &format!(" style=\"color: {}\"", escape_attr(color)),
                inner,
            ),
            FormatCommand::HiliteColor(color) => wrap(
                "span",
                &format!(" style=\"background-color: {}\"", escape_attr(color)),
                inner,
            ),
            FormatCommand::CreateLink(url) => {
                wrap("a", &format!(" href=\"{}\"", escape_attr(url)), inner)
            }
            FormatCommand::Unlink => strip_anchors(inner),
        };

        if replacement == inner {
            return false;
        }

        self.markup.replace_range(range.start..range.end, &replacement);
        self.selection = Some(ActiveSelection::Inside(TextRange::new(
            range.start,
            range.start + replacement.len(),
        )));
        true
    }
}

fn wrap(tag: &str, attrs: &str, inner: &str) -> String {
    format!("<{tag}{attrs}>{inner}</{tag}>")
}

fn strip_anchors(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut rest = fragment;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('>') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let tag = &rest[open..open + close + 1];
        let name = tag
            .trim_start_matches('<')
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '>')
            .next()
            .unwrap_or("");
        if !name.eq_ignore_ascii_case("a") {
            out.push_str(tag);
        }
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    out
}
