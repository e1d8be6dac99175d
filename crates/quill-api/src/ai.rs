use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::warn;

use quill_types::api::{Claims, TransformRequest, TransformResponse};
use quill_types::{TransformError, TransformService};

use crate::auth::AppState;

pub async fn transform(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<TransformRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.text.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let ai = state.ai.as_ref().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;

    let text = ai.transform(&req.text, req.kind).await.map_err(|e| {
        warn!(user_id = %claims.sub, kind = %req.kind, "Transform failed: {}", e);
        match e {
            TransformError::EmptyInput => StatusCode::BAD_REQUEST,
            TransformError::EmptyResponse | TransformError::Provider(_) => StatusCode::BAD_GATEWAY,
        }
    })?;

    Ok(Json(TransformResponse { text }))
}
