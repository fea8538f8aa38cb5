//! Serving file bytes through signed `/disk/...` URLs.
//!
//! The signed token carries everything needed to serve the response, so this
//! route never touches the metadata store.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use tracing::debug;

use holdfast_storage::{FILE_SYSTEM_PURPOSE, FileToken};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn serve_disk(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Response> {
    stream_file(&state, &token).await
}

pub async fn serve_disk_named(
    State(state): State<AppState>,
    Path((token, _filename)): Path<(String, String)>,
) -> ApiResult<Response> {
    stream_file(&state, &token).await
}

async fn stream_file(state: &AppState, token: &str) -> ApiResult<Response> {
    let token: FileToken = state.signer.unsign(token, Some(FILE_SYSTEM_PURPOSE))?;

    let handle = state.registry.get(&token.backend)?;
    let stream = handle.store.get_stream(&token.key).await?;

    let mime_type = token
        .mime_type
        .unwrap_or_else(|| state.config.service.default_mime_type.clone());
    let disposition = token.disposition.unwrap_or_else(|| "inline".to_string());

    debug!(key = %token.key, backend = %token.backend, "streaming file");
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
