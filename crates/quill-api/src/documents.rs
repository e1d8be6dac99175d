use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use quill_types::api::{Claims, CreateDocumentRequest, DocumentListResponse, DocumentResponse};
use quill_types::{DocumentPatch, normalize_title};

use crate::auth::AppState;
use crate::convert::{document_from_row, now_string, summary_from_row};
use crate::run_blocking;

// Every query is scoped to the caller. A document owned by someone else is
// reported exactly like a missing one.

pub async fn list_documents(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let owner = claims.sub.to_string();
    let rows = run_blocking(&state, move |db| db.list_documents(&owner)).await?;

    let documents = rows.into_iter().filter_map(summary_from_row).collect();
    Ok(Json(DocumentListResponse { documents }))
}

pub async fn create_document(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let id = Uuid::new_v4().to_string();
    let owner = claims.sub.to_string();
    let title = normalize_title(req.title.as_deref().unwrap_or_default());
    let content = req.content.unwrap_or_default();
    let now = now_string();

    let row = run_blocking(&state, move |db| {
        db.insert_document(&id, &owner, &title, &content, &now)
    })
    .await?;
    let document = document_from_row(row).ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    info!(document_id = %document.id, owner = %claims.sub, "Document created");
    Ok((StatusCode::CREATED, Json(DocumentResponse { document })))
}

pub async fn get_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let (id, owner) = (document_id.to_string(), claims.sub.to_string());
    let row = run_blocking(&state, move |db| db.get_document(&id, &owner))
        .await?
        .ok_or(StatusCode::NOT_FOUND)?;

    let document = document_from_row(row).ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(DocumentResponse { document }))
}

pub async fn update_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(patch): Json<DocumentPatch>,
) -> Result<impl IntoResponse, StatusCode> {
    let (id, owner) = (document_id.to_string(), claims.sub.to_string());
    let title = patch.title.as_deref().map(normalize_title);
    let content = patch.content;
    let now = now_string();

    let row = run_blocking(&state, move |db| {
        db.update_document(&id, &owner, title.as_deref(), content.as_deref(), &now)
    })
    .await?
    .ok_or(StatusCode::NOT_FOUND)?;

    let document = document_from_row(row).ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(DocumentResponse { document }))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let (id, owner) = (document_id.to_string(), claims.sub.to_string());
    let deleted = run_blocking(&state, move |db| db.soft_delete_document(&id, &owner)).await?;
    if !deleted {
        return Err(StatusCode::NOT_FOUND);
    }

    info!(%document_id, owner = %claims.sub, "Document deleted");
    Ok(StatusCode::NO_CONTENT)
}
