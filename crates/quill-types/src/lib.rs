pub mod api;
pub mod models;
pub mod service;
pub mod transform;

pub use models::{
    DEFAULT_TITLE, Document, DocumentId, DocumentSummary, Role, User, UserId, normalize_title,
};
pub use service::{DocumentPatch, DocumentStore, StoreError, TransformError, TransformService};
pub use transform::TransformKind;
