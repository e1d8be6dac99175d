use thiserror::Error;

use quill_types::{StoreError, TransformError};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("select some text to transform first")]
    EmptySelection,
    #[error("there is no text to transform")]
    EmptyInput,
    #[error("the selection changed before the transformation finished")]
    SelectionLost,
    #[error("the document changed while the transformation was running")]
    Conflict,
    #[error("no document is open")]
    NoDocument,
    #[error("document not found")]
    NotFound,
    #[error("the AI service returned an empty response")]
    EmptyResponse,
    #[error("transformation failed: {0}")]
    Transform(TransformError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("the editor has been closed")]
    Closed,
}

impl From<TransformError> for EditorError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::EmptyInput => Self::EmptyInput,
            TransformError::EmptyResponse => Self::EmptyResponse,
            other => Self::Transform(other),
        }
    }
}

impl EditorError {
    /// Validation failures are caught before any network call or mutation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptySelection | Self::EmptyInput | Self::SelectionLost | Self::NoDocument
        )
    }
}

/// Result of a completion that may have been superseded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Applied(T),
    /// A newer request of the same kind replaced this one, or the editor was
    /// closed. Nothing changed.
    Discarded,
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Discarded => None,
        }
    }
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
