//! Route configuration.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the application router.
///
/// Every content route has a variant with a trailing display filename; the
/// filename is cosmetic and never consulted, all state lives in the signed
/// path segment.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/blobs/{signed_id}", get(handlers::show_blob))
        .route(
            "/blobs/{signed_id}/{filename}",
            get(handlers::show_blob_named),
        )
        .route(
            "/representations/{signed_blob_id}/{variation_key}",
            get(handlers::show_representation),
        )
        .route(
            "/representations/{signed_blob_id}/{variation_key}/{filename}",
            get(handlers::show_representation_named),
        )
        .route("/disk/{token}", get(handlers::serve_disk))
        .route("/disk/{token}/{filename}", get(handlers::serve_disk_named))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
