//! Core error types.

use thiserror::Error;

/// Errors from core domain operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid key prefix template: {0}")]
    InvalidKeyPrefix(#[from] time::error::InvalidFormatDescription),

    #[error("time formatting error: {0}")]
    TimeFormat(#[from] time::error::Format),

    #[error("signing error: {0}")]
    Signer(#[from] holdfast_signer::SignerError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
