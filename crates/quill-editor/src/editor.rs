use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use quill_types::{
    DEFAULT_TITLE, Document, DocumentId, DocumentStore, DocumentSummary, StoreError,
    TransformError, TransformKind, TransformService, UserId, normalize_title,
};

use crate::cancel::{OperationKind, RequestSlots, Ticket};
use crate::config::EditorConfig;
use crate::error::{EditorError, Outcome, Result};
use crate::history::History;
use crate::selection::{SelectionSnapshot, SelectionTracker};
use crate::session::{DocumentSession, LoadOutcome, SaveRequest, SaveStatus};
use crate::shortcuts::{EditorAction, KeyChord, action_for};
use crate::stats::DocumentStats;
use crate::surface::{EditableSurface, FormatCommand};
use crate::transform::{PendingTransform, TransformScope, splice};

/// A save waiting on the store.
#[derive(Debug)]
pub struct PendingSave {
    ticket: Ticket,
    request: SaveRequest,
}

impl PendingSave {
    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    pub fn request(&self) -> &SaveRequest {
        &self.request
    }
}

/// Editing session for one user.
///
/// `S` is the editing surface, `D` the document store and `T` the
/// transformation service. Network work comes in two shapes: one-shot async
/// methods (`save`, `transform_selection`, ...) and `begin_*`/`finish_*`
/// pairs for hosts that run the request themselves. Either way, each kind of
/// request has at most one live ticket and superseded results are dropped.
pub struct Editor<S, D, T> {
    owner: UserId,
    surface: S,
    store: D,
    transformer: T,
    tracker: SelectionTracker,
    history: History,
    session: DocumentSession,
    requests: RequestSlots,
    documents: Vec<DocumentSummary>,
    /// Bumped on every content mutation. Pending work captured at an older
    /// revision no longer matches the surface.
    revision: u64,
    last_error: Option<String>,
}

impl<S, D, T> Editor<S, D, T>
where
    S: EditableSurface,
    D: DocumentStore,
    T: TransformService,
{
    pub fn new(owner: UserId, surface: S, store: D, transformer: T, config: EditorConfig) -> Self {
        Self {
            owner,
            surface,
            store,
            transformer,
            tracker: SelectionTracker::new(),
            history: History::new(config.history_limit),
            session: DocumentSession::new(),
            requests: RequestSlots::new(),
            documents: Vec::new(),
            revision: 0,
            last_error: None,
        }
    }

    // -- Accessors --

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Direct access for host input. Call [`Editor::content_changed`] or
    /// [`Editor::selection_changed`] afterwards.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    pub fn session(&self) -> &DocumentSession {
        &self.session
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn documents(&self) -> &[DocumentSummary] {
        &self.documents
    }

    pub fn selection(&self) -> Option<&SelectionSnapshot> {
        self.tracker.valid_at(self.revision)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True while any request is outstanding.
    pub fn busy(&self) -> bool {
        self.requests.busy()
    }

    pub fn is_transforming(&self) -> bool {
        self.requests.in_flight(OperationKind::Transform)
    }

    pub fn save_status(&self) -> SaveStatus {
        self.session.status(self.requests.in_flight(OperationKind::Save))
    }

    pub fn stats(&self) -> DocumentStats {
        DocumentStats::from_text(&self.surface.plain_text())
    }

    /// Message for the most recent failure, until dismissed.
    pub fn error_message(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    // -- Documents --

    /// Load the document list and open the newest document, creating one if
    /// the user has none.
    pub async fn bootstrap(&mut self) -> Result<DocumentId> {
        self.list_documents().await?;
        match self.documents.first().map(|d| d.id) {
            Some(id) => {
                self.open_document(id).await?;
                Ok(id)
            }
            None => {
                info!(owner = %self.owner, "No documents yet, creating a blank one");
                self.create_document(DEFAULT_TITLE).await
            }
        }
    }

    /// Refresh the document list, newest first.
    pub async fn list_documents(&mut self) -> Result<&[DocumentSummary]> {
        let ticket = self.issue(OperationKind::Fetch)?;
        let result = self.store.fetch_all(self.owner).await;
        if !self.requests.complete(&ticket) {
            return Err(EditorError::Closed);
        }

        let mut documents = result.map_err(|e| self.fail(e.into()))?;
        documents.sort_by(|a, b| b.last_edited.cmp(&a.last_edited));
        debug!(owner = %self.owner, count = documents.len(), "Loaded document list");
        self.documents = documents;
        Ok(&self.documents)
    }

    /// Open a document. Re-opening the current document keeps local edits
    /// and makes no request.
    pub async fn open_document(&mut self, id: DocumentId) -> Result<LoadOutcome> {
        self.ensure_open()?;
        if self.session.document_id() == Some(id) {
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        let ticket = self.issue(OperationKind::Fetch)?;
        let result = self.store.fetch_one(id, self.owner).await;
        if !self.requests.complete(&ticket) {
            return Err(EditorError::Closed);
        }

        let document = result
            .map_err(|e| self.fail(e.into()))?
            .ok_or_else(|| self.fail(EditorError::NotFound))?;
        Ok(self.load(&document))
    }

    /// Create a document and open it.
    pub async fn create_document(&mut self, title: &str) -> Result<DocumentId> {
        let ticket = self.issue(OperationKind::Fetch)?;
        let title = normalize_title(title);
        let result = self.store.create(self.owner, &title, "").await;
        if !self.requests.complete(&ticket) {
            return Err(EditorError::Closed);
        }

        let document = result.map_err(|e| self.fail(e.into()))?;
        info!(document_id = %document.id, "Created document");
        self.documents.insert(0, document.summary());
        self.load(&document);
        Ok(document.id)
    }

    /// Soft-delete a document. If it was open, the newest remaining document
    /// is opened instead, or the editor is left empty.
    pub async fn delete_document(&mut self, id: DocumentId) -> Result<()> {
        let ticket = self.issue(OperationKind::Fetch)?;
        let result = self.store.soft_delete(id, self.owner).await;
        if !self.requests.complete(&ticket) {
            return Err(EditorError::Closed);
        }

        if !result.map_err(|e| self.fail(e.into()))? {
            return Err(self.fail(EditorError::NotFound));
        }
        info!(document_id = %id, "Deleted document");
        self.documents.retain(|d| d.id != id);

        if self.session.document_id() == Some(id) {
            self.unload();
            if let Some(next) = self.documents.first().map(|d| d.id) {
                self.open_document(next).await?;
            }
        }
        Ok(())
    }

    fn load(&mut self, document: &Document) -> LoadOutcome {
        let outcome = self.session.load(document);
        if outcome == LoadOutcome::Loaded {
            self.history.clear();
            self.tracker.clear();
            self.surface.set_content(&document.content);
            self.revision += 1;
            debug!(document_id = %document.id, "Loaded document into the editor");
        }
        outcome
    }

    fn unload(&mut self) {
        self.session.clear();
        self.history.clear();
        self.tracker.clear();
        self.surface.set_content("");
        self.revision += 1;
    }

    // -- Local edits --

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.session.set_title(title);
    }

    /// The host changed the surface content (typing, paste). Never saves.
    pub fn content_changed(&mut self) {
        self.revision += 1;
        self.tracker.clear();
        self.session.set_content(self.surface.content());
    }

    pub fn selection_changed(&mut self) -> Option<&SelectionSnapshot> {
        self.tracker.observe(&self.surface, self.revision)
    }

    /// Apply a formatting command to the active selection as one undoable
    /// step. Returns false if the surface made no change.
    pub fn format(&mut self, command: &FormatCommand) -> Result<bool> {
        self.ensure_open()?;
        let before = self.surface.content();
        if !self.surface.exec_format(command) {
            return Ok(false);
        }
        self.history.record_before_change(before);
        self.after_mutation();
        Ok(true)
    }

    pub fn undo(&mut self) -> Result<bool> {
        self.ensure_open()?;
        let current = self.surface.content();
        let Some(previous) = self.history.undo(&current) else {
            return Ok(false);
        };
        self.surface.set_content(&previous);
        self.after_mutation();
        Ok(true)
    }

    pub fn redo(&mut self) -> Result<bool> {
        self.ensure_open()?;
        let current = self.surface.content();
        let Some(next) = self.history.redo(&current) else {
            return Ok(false);
        };
        self.surface.set_content(&next);
        self.after_mutation();
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn after_mutation(&mut self) {
        self.revision += 1;
        self.tracker.clear();
        self.session.set_content(self.surface.content());
    }

    // -- Transformations --

    /// Validate the tracked selection and start a transformation of it. Any
    /// earlier pending transformation is superseded.
    pub fn begin_transform_selection(&mut self, kind: TransformKind) -> Result<PendingTransform> {
        self.ensure_open()?;
        let Some(snapshot) = self.tracker.valid_at(self.revision).cloned() else {
            return Err(self.fail(EditorError::EmptySelection));
        };
        if snapshot.text.trim().is_empty() {
            return Err(self.fail(EditorError::EmptySelection));
        }

        let ticket = self.issue(OperationKind::Transform)?;
        debug!(%kind, chars = snapshot.text.len(), "Transforming selection");
        Ok(PendingTransform {
            ticket,
            kind,
            scope: TransformScope::Selection,
            input: snapshot.text,
            range: snapshot.range,
            revision: self.revision,
        })
    }

    /// Start a transformation of the whole document's text.
    pub fn begin_transform_document(&mut self, kind: TransformKind) -> Result<PendingTransform> {
        self.ensure_open()?;
        let text = self.surface.plain_text();
        if text.trim().is_empty() {
            return Err(self.fail(EditorError::EmptyInput));
        }

        let ticket = self.issue(OperationKind::Transform)?;
        debug!(%kind, chars = text.len(), "Transforming document");
        Ok(PendingTransform {
            ticket,
            kind,
            scope: TransformScope::Document,
            input: text.trim().to_string(),
            range: self.surface.full_range(),
            revision: self.revision,
        })
    }

    /// Apply the service's answer for `pending`. Superseded or post-close
    /// results are discarded without touching anything.
    pub fn finish_transform(
        &mut self,
        pending: PendingTransform,
        result: std::result::Result<String, TransformError>,
    ) -> Result<Outcome<()>> {
        if !self.requests.complete(&pending.ticket) {
            debug!(
                generation = pending.ticket.generation(),
                "Discarding superseded transformation"
            );
            return Ok(Outcome::Discarded);
        }

        let text = result.map_err(|e| self.fail(e.into()))?;
        if text.trim().is_empty() {
            return Err(self.fail(EditorError::EmptyResponse));
        }

        let range = match pending.scope {
            TransformScope::Selection => {
                let live = self
                    .surface
                    .selection()
                    .filter(|sel| sel.within_region && sel.range == pending.range);
                if live.is_none() || self.revision != pending.revision {
                    return Err(self.fail(EditorError::SelectionLost));
                }
                pending.range
            }
            TransformScope::Document => {
                if self.revision != pending.revision {
                    return Err(self.fail(EditorError::Conflict));
                }
                self.surface.full_range()
            }
        };

        splice(&mut self.surface, &mut self.history, range, &text);
        self.after_mutation();
        info!(kind = %pending.kind, scope = ?pending.scope, "Applied transformation");
        Ok(Outcome::Applied(()))
    }

    /// Transform the tracked selection and apply the result.
    pub async fn transform_selection(&mut self, kind: TransformKind) -> Result<Outcome<()>> {
        let pending = self.begin_transform_selection(kind)?;
        self.run_transform(pending).await
    }

    /// Transform the whole document and replace it with the result.
    pub async fn transform_document(&mut self, kind: TransformKind) -> Result<Outcome<()>> {
        let pending = self.begin_transform_document(kind)?;
        self.run_transform(pending).await
    }

    async fn run_transform(&mut self, pending: PendingTransform) -> Result<Outcome<()>> {
        let token = pending.ticket.token().clone();
        let result = tokio::select! {
            _ = token.cancelled() => return Ok(Outcome::Discarded),
            result = self.transformer.transform(&pending.input, pending.kind) => result,
        };
        self.finish_transform(pending, result)
    }

    // -- Saving --

    pub fn begin_save(&mut self) -> Result<PendingSave> {
        self.ensure_open()?;
        let Some(request) = self.session.save_request() else {
            return Err(self.fail(EditorError::NoDocument));
        };
        let ticket = self.issue(OperationKind::Save)?;
        debug!(document_id = %request.id, "Saving document");
        Ok(PendingSave { ticket, request })
    }

    /// Record the store's answer. On failure local state is left as it was.
    pub fn finish_save(
        &mut self,
        pending: PendingSave,
        result: std::result::Result<Option<Document>, StoreError>,
    ) -> Result<Outcome<DateTime<Utc>>> {
        if !self.requests.complete(&pending.ticket) {
            debug!(document_id = %pending.request.id, "Discarding superseded save");
            return Ok(Outcome::Discarded);
        }

        let stored = result
            .map_err(|e| self.fail(e.into()))?
            .ok_or_else(|| self.fail(EditorError::NotFound))?;

        self.session.mark_saved(&pending.request, &stored);
        if let Some(summary) = self.documents.iter_mut().find(|d| d.id == stored.id) {
            *summary = stored.summary();
        }
        self.documents.sort_by(|a, b| b.last_edited.cmp(&a.last_edited));

        info!(document_id = %stored.id, "Document saved");
        Ok(Outcome::Applied(stored.last_edited))
    }

    pub async fn save(&mut self) -> Result<Outcome<DateTime<Utc>>> {
        let pending = self.begin_save()?;
        let token = pending.ticket.token().clone();
        let result = tokio::select! {
            _ = token.cancelled() => return Ok(Outcome::Discarded),
            result = self.store.update(pending.request.id, self.owner, pending.request.patch()) => result,
        };
        self.finish_save(pending, result)
    }

    // -- Keyboard --

    /// Run the action bound to `chord`, if any.
    pub async fn handle_shortcut(&mut self, chord: &KeyChord) -> Result<Option<EditorAction>> {
        let Some(action) = action_for(chord) else {
            return Ok(None);
        };
        match &action {
            EditorAction::Format(command) => {
                self.format(command)?;
            }
            EditorAction::Undo => {
                self.undo()?;
            }
            EditorAction::Redo => {
                self.redo()?;
            }
            EditorAction::Save => {
                self.save().await?;
            }
        }
        Ok(Some(action))
    }

    // -- Lifecycle --

    /// Cancel all outstanding requests. Later completions are discarded and
    /// later operations fail with [`EditorError::Closed`].
    pub fn close(&mut self) {
        if self.requests.is_closed() {
            return;
        }
        self.requests.close();
        self.tracker.clear();
        info!(owner = %self.owner, "Editor closed");
    }

    pub fn is_closed(&self) -> bool {
        self.requests.is_closed()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.requests.is_closed() {
            Err(EditorError::Closed)
        } else {
            Ok(())
        }
    }

    fn issue(&mut self, kind: OperationKind) -> Result<Ticket> {
        self.requests.issue(kind).ok_or(EditorError::Closed)
    }

    fn fail(&mut self, err: EditorError) -> EditorError {
        if err.is_validation() {
            debug!("Rejected: {}", err);
        } else {
            warn!("Editor operation failed: {}", err);
        }
        self.last_error = Some(err.to_string());
        err
    }
}
