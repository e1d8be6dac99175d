/// Editor behavior knobs.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Maximum undo depth. `None` keeps every snapshot for the session.
    pub history_limit: Option<usize>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: Some(100),
        }
    }
}
