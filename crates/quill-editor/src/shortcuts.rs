use crate::surface::FormatCommand;

/// A key press with its modifiers, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyChord {
    pub key: String,
    pub ctrl: bool,
    /// Cmd on macOS.
    pub meta: bool,
    pub shift: bool,
}

impl KeyChord {
    pub fn ctrl(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ctrl: true,
            ..Self::default()
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    Format(FormatCommand),
    Undo,
    Redo,
    Save,
}

/// Map a chord to an editor action. Only Ctrl/Cmd combinations are bound.
pub fn action_for(chord: &KeyChord) -> Option<EditorAction> {
    if !(chord.ctrl || chord.meta) {
        return None;
    }

    let action = match (chord.key.to_ascii_lowercase().as_str(), chord.shift) {
        ("b", false) => EditorAction::Format(FormatCommand::Bold),
        ("i", false) => EditorAction::Format(FormatCommand::Italic),
        ("u", false) => EditorAction::Format(FormatCommand::Underline),
        ("z", false) => EditorAction::Undo,
        ("z", true) | ("y", _) => EditorAction::Redo,
        ("s", _) => EditorAction::Save,
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_standard_bindings() {
        assert_eq!(
            action_for(&KeyChord::ctrl("b")),
            Some(EditorAction::Format(FormatCommand::Bold))
        );
        assert_eq!(action_for(&KeyChord::ctrl("Z")), Some(EditorAction::Undo));
        assert_eq!(action_for(&KeyChord::ctrl("z").with_shift()), Some(EditorAction::Redo));
        assert_eq!(action_for(&KeyChord::ctrl("y")), Some(EditorAction::Redo));
        assert_eq!(action_for(&KeyChord::ctrl("s")), Some(EditorAction::Save));
    }

    #[test]
    fn cmd_works_like_ctrl() {
        let chord = KeyChord {
            key: "i".into(),
            meta: true,
            ..KeyChord::default()
        };
        assert_eq!(action_for(&chord), Some(EditorAction::Format(FormatCommand::Italic)));
    }

    #[test]
    fn unmodified_or_unbound_keys_do_nothing() {
        let plain = KeyChord {
            key: "b".into(),
            ..KeyChord::default()
        };
        assert_eq!(action_for(&plain), None);
        assert_eq!(action_for(&KeyChord::ctrl("q")), None);
        assert_eq!(action_for(&KeyChord::ctrl("b").with_shift()), None);
    }
}
