//! Request handlers.

mod blobs;
mod disk;
mod health;
mod representations;

pub use blobs::{show_blob, show_blob_named};
pub use disk::{serve_disk, serve_disk_named};
pub use health::health_check;
pub use representations::{show_representation, show_representation_named};

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

/// 302 redirect to a freshly generated URL.
///
/// Deliberately not 301: every generated URL is short-lived, so nothing may
/// cache the redirect target.
pub(crate) fn found(url: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, url)]).into_response()
}
