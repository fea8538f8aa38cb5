//! On-demand representations: derive (or reuse) a variant, then redirect.

use axum::extract::{Path, State};
use axum::response::Response;
use tracing::debug;

use holdfast_core::Blob;
use holdfast_media::representation;
use holdfast_metadata::BlobRepo;

use crate::error::{ApiError, ApiResult};
use crate::handlers::found;
use crate::state::AppState;

pub async fn show_representation(
    State(state): State<AppState>,
    Path((signed_blob_id, variation_key)): Path<(String, String)>,
) -> ApiResult<Response> {
    representation_redirect(&state, &signed_blob_id, &variation_key).await
}

pub async fn show_representation_named(
    State(state): State<AppState>,
    Path((signed_blob_id, variation_key, _filename)): Path<(String, String, String)>,
) -> ApiResult<Response> {
    representation_redirect(&state, &signed_blob_id, &variation_key).await
}

async fn representation_redirect(
    state: &AppState,
    signed_blob_id: &str,
    variation_key: &str,
) -> ApiResult<Response> {
    let key = Blob::unsign_key(&state.signer, signed_blob_id, None)?;
    let blob = state
        .metadata
        .get_blob_by_key(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no blob at key {key}")))?;

    let handle = state.registry.get(&blob.backend)?;
    let variant = representation(&state.media, blob, variation_key)?;
    variant
        .ensure_processed(&state.media, handle.store.as_ref())
        .await?;
    let url = variant.url(&state.media, handle).await?;

    debug!(blob = %variant.blob.id, "redirecting to representation");
    Ok(found(url))
}
