//! Media pipeline error types.

use thiserror::Error;

/// Errors from the transformation pipeline and variant orchestration.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("blob is not representable: {mime_type}")]
    NotRepresentable { mime_type: String },

    #[error("transformation '{name}' is not supported by processor '{processor}'")]
    UnsupportedTransformation { name: String, processor: String },

    #[error("invalid arguments for transformation '{name}': {reason}")]
    InvalidTransformationArgs { name: String, reason: String },

    #[error("unknown output format: {0}")]
    UnknownFormat(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("storage error: {0}")]
    Storage(#[from] holdfast_storage::StorageError),

    #[error("metadata error: {0}")]
    Metadata(#[from] holdfast_metadata::MetadataError),

    #[error("signing error: {0}")]
    Signer(#[from] holdfast_signer::SignerError),

    #[error(transparent)]
    Core(#[from] holdfast_core::Error),
}

/// Result type for media operations.
pub type MediaResult<T> = std::result::Result<T, MediaError>;
