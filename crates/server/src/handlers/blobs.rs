//! Blob serving: signed id in, redirect to the bytes out.

use axum::extract::{Path, State};
use axum::response::Response;
use tracing::debug;

use holdfast_core::Blob;
use holdfast_metadata::BlobRepo;
use holdfast_storage::UrlOptions;

use crate::error::{ApiError, ApiResult};
use crate::handlers::found;
use crate::state::AppState;

pub async fn show_blob(
    State(state): State<AppState>,
    Path(signed_id): Path<String>,
) -> ApiResult<Response> {
    blob_redirect(&state, &signed_id).await
}

pub async fn show_blob_named(
    State(state): State<AppState>,
    Path((signed_id, _filename)): Path<(String, String)>,
) -> ApiResult<Response> {
    blob_redirect(&state, &signed_id).await
}

async fn blob_redirect(state: &AppState, signed_id: &str) -> ApiResult<Response> {
    let key = Blob::unsign_key(&state.signer, signed_id, None)?;
    let blob = state
        .metadata
        .get_blob_by_key(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no blob at key {key}")))?;

    let handle = state.registry.get(&blob.backend)?;
    let url = handle
        .urls
        .url(
            handle.store.as_ref(),
            &state.signer,
            &blob.key,
            UrlOptions {
                filename: blob.filename.clone(),
                mime_type: Some(blob.mime_type.clone()),
                ..UrlOptions::default()
            },
        )
        .await?;

    debug!(blob = %blob.id, backend = %blob.backend, "redirecting to blob content");
    Ok(found(url))
}
