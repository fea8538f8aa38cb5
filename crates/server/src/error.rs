//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use holdfast_media::MediaError;
use holdfast_metadata::MetadataError;
use holdfast_storage::StorageError;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("media error: {0}")]
    Media(#[from] MediaError),

    #[error("signer error: {0}")]
    Signer(#[from] holdfast_signer::SignerError),

    #[error("core error: {0}")]
    Core(#[from] holdfast_core::Error),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self.status_code() {
            StatusCode::NOT_FOUND => "not_found",
            StatusCode::BAD_REQUEST => "bad_request",
            _ => "internal_error",
        }
    }

    /// HTTP status for this error.
    ///
    /// Every signature failure maps to a plain 404: expired, forged, and
    /// never-existed URLs are indistinguishable to a client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Signer(_) => StatusCode::NOT_FOUND,
            Self::Storage(e) => match e {
                StorageError::NotFound(_)
                | StorageError::UnknownBackend(_)
                | StorageError::InvalidKey(_)
                | StorageError::Signer(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Metadata(e) => match e {
                MetadataError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Media(e) => match e {
                MediaError::NotRepresentable { .. }
                | MediaError::UnsupportedTransformation { .. }
                | MediaError::InvalidTransformationArgs { .. }
                | MediaError::UnknownFormat(_) => StatusCode::BAD_REQUEST,
                MediaError::Signer(_) => StatusCode::NOT_FOUND,
                MediaError::Core(holdfast_core::Error::Signer(_)) => StatusCode::NOT_FOUND,
                MediaError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
                MediaError::Metadata(MetadataError::NotFound(_)) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Core(e) => match e {
                holdfast_core::Error::Signer(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
        }
        // Don't leak error internals through 404s; the body stays generic.
        let message = match status {
            StatusCode::NOT_FOUND => "not found".to_string(),
            _ => self.to_string(),
        };
        let body = Json(ErrorResponse {
            code: self.code().to_string(),
            message,
        });
        (status, body).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use holdfast_signer::SignerError;

    #[test]
    fn test_signature_failures_are_plain_not_found() {
        assert_eq!(
            ApiError::Signer(SignerError::InvalidSignature).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Signer(SignerError::ExpiredSignature).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Signer(SignerError::InvalidPurpose).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_not_representable_is_bad_request() {
        let err = ApiError::Media(MediaError::NotRepresentable {
            mime_type: "text/plain".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_object_is_not_found() {
        let err = ApiError::Storage(StorageError::NotFound("k".to_string()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        let err = ApiError::Storage(StorageError::UnknownBackend("x".to_string()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
