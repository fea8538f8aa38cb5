//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use holdfast_metadata::MetadataStore;

use crate::error::ApiResult;
use crate::state::AppState;

/// Liveness plus a metadata-store round trip.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.metadata.health_check().await?;
    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
