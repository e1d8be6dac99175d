use crate::markup::word_count;

pub const WORDS_PER_MINUTE: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentStats {
    pub words: usize,
    pub minutes: usize,
    pub seconds: usize,
}

impl DocumentStats {
    pub fn from_text(text: &str) -> Self {
        let words = word_count(text);
        Self {
            words,
            minutes: words / WORDS_PER_MINUTE,
            // 2.5 words per second at 150 wpm.
            seconds: (words % WORDS_PER_MINUTE) * 2 / 5,
        }
    }

    /// Estimated speaking time as `m:ss`.
    pub fn duration_label(&self) -> String {
        format!("{}:{:02}", self.minutes, self.seconds)
    }
}
