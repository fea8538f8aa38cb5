//! HTTP serving surface for Holdfast.
//!
//! Three public routes, all driven by signed path segments:
//! - `/blobs/...` redirects a signed blob id to its content URL
//! - `/representations/...` derives an image variant on demand, then redirects
//! - `/disk/...` streams bytes for backends without their own URLs

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use bootstrap::build_state;
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;
