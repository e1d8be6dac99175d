//! Contracts for the collaborators the editing core talks to.
//!
//! Both traits are implemented over HTTP by `quill-editor::remote`; the AI
//! contract is also implemented directly by `quill-ai` on the server.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Document, DocumentId, DocumentSummary, UserId};
use crate::transform::TransformKind;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not authenticated")]
    Unauthorized,
    #[error("store is scoped to another user (requested owner {0})")]
    OwnerMismatch(UserId),
    #[error("store returned status {0}")]
    Status(u16),
    #[error("store request failed: {0}")]
    Request(String),
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("no text provided for transformation")]
    EmptyInput,
    #[error("AI provider returned an empty response")]
    EmptyResponse,
    #[error("AI provider request failed: {0}")]
    Provider(String),
}

/// Partial update of a document. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Owner-scoped document persistence.
///
/// A document owned by someone else must be indistinguishable from one that
/// does not exist: `fetch_one`/`update` return `None` and `soft_delete`
/// returns `false`.
pub trait DocumentStore {
    fn fetch_all(
        &self,
        owner: UserId,
    ) -> impl Future<Output = Result<Vec<DocumentSummary>, StoreError>> + Send;

    fn fetch_one(
        &self,
        id: DocumentId,
        owner: UserId,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>> + Send;

    fn create(
        &self,
        owner: UserId,
        title: &str,
        content: &str,
    ) -> impl Future<Output = Result<Document, StoreError>> + Send;

    fn update(
        &self,
        id: DocumentId,
        owner: UserId,
        patch: DocumentPatch,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>> + Send;

    fn soft_delete(
        &self,
        id: DocumentId,
        owner: UserId,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

/// Turns text into its transformed form. Implementations return only the
/// transformed text, with no commentary around it.
pub trait TransformService {
    fn transform(
        &self,
        text: &str,
        kind: TransformKind,
    ) -> impl Future<Output = Result<String, TransformError>> + Send;
}
