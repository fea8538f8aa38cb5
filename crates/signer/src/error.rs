//! Signer error types.

use thiserror::Error;

/// Signing operation errors.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("purpose mismatch")]
    InvalidPurpose,

    #[error("signature expired")]
    ExpiredSignature,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("secret resolution error: {0}")]
    SecretResolution(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for signing operations.
pub type SignerResult<T> = std::result::Result<T, SignerError>;
