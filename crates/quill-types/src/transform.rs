use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the AI service should alter a piece of text. Names are matched
/// case-insensitively when parsed or deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum TransformKind {
    Enhance,
    Expand,
    Simplify,
    Summarize,
    Rewrite,
    /// The input is an instruction for the model, not content to transform.
    Command,
}

impl TransformKind {
    pub const ALL: [TransformKind; 6] = [
        Self::Enhance,
        Self::Expand,
        Self::Simplify,
        Self::Summarize,
        Self::Rewrite,
        Self::Command,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enhance => "enhance",
            Self::Expand => "expand",
            Self::Simplify => "simplify",
            Self::Summarize => "summarize",
            Self::Rewrite => "rewrite",
            Self::Command => "command",
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transformation kind '{0}'")]
pub struct UnknownTransformKind(pub String);

impl FromStr for TransformKind {
    type Err = UnknownTransformKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTransformKind(s.to_string()))
    }
}

impl TryFrom<String> for TransformKind {
    type Error = UnknownTransformKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
