use chrono::{DateTime, Utc};
use tracing::debug;

use quill_types::{Document, DocumentId, DocumentPatch, normalize_title};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// Same id as the open document; local edits were kept.
    AlreadyLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    Saving,
    Unsaved,
}

/// What a save sends, captured when the save starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub id: DocumentId,
    pub title: String,
    pub content: String,
}

impl SaveRequest {
    pub fn patch(&self) -> DocumentPatch {
        DocumentPatch {
            title: Some(normalize_title(&self.title)),
            content: Some(self.content.clone()),
        }
    }
}

/// The open document as the user currently sees it, plus what was last
/// confirmed by the store.
#[derive(Debug, Default)]
pub struct DocumentSession {
    document_id: Option<DocumentId>,
    title: String,
    content: String,
    saved_title: String,
    saved_content: String,
    last_saved: Option<DateTime<Utc>>,
}

impl DocumentSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, document: &Document) -> LoadOutcome {
        if self.document_id == Some(document.id) {
            debug!(document_id = %document.id, "Document already loaded, keeping local edits");
            return LoadOutcome::AlreadyLoaded;
        }

        self.document_id = Some(document.id);
        self.title = normalize_title(&document.title);
        self.content = document.content.clone();
        self.saved_title = self.title.clone();
        self.saved_content = self.content.clone();
        self.last_saved = Some(document.last_edited);
        LoadOutcome::Loaded
    }

    pub fn document_id(&self) -> Option<DocumentId> {
        self.document_id
    }

    pub fn is_open(&self) -> bool {
        self.document_id.is_some()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn is_dirty(&self) -> bool {
        self.document_id.is_some()
            && (self.title != self.saved_title || self.content != self.saved_content)
    }

    pub fn status(&self, saving: bool) -> SaveStatus {
        if saving {
            SaveStatus::Saving
        } else if self.is_dirty() {
            SaveStatus::Unsaved
        } else {
            SaveStatus::Saved
        }
    }

    pub fn save_request(&self) -> Option<SaveRequest> {
        Some(SaveRequest {
            id: self.document_id?,
            title: self.title.clone(),
            content: self.content.clone(),
        })
    }

    /// Record a successful save. Edits made while the save was in flight
    /// keep the session dirty.
    pub fn mark_saved(&mut self, request: &SaveRequest, stored: &Document) {
        if self.document_id != Some(request.id) {
            return;
        }
        self.saved_title = request.title.clone();
        self.saved_content = request.content.clone();
        self.last_saved = Some(stored.last_edited);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
