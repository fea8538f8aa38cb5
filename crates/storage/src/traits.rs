//! Storage trait definitions.

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use time::Duration;

/// A boxed stream of bytes for streaming reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// Response-header overrides carried by a presigned URL.
#[derive(Clone, Debug, Default)]
pub struct PresignOptions {
    pub expires_in: Duration,
    pub response_content_type: Option<String>,
    pub response_content_disposition: Option<String>,
}

/// Object store abstraction over blob byte storage.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Check if an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Get an object's content.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Get an object as a byte stream.
    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream>;

    /// Put an object atomically. A reader never observes a partial write.
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// The backend's own URL for an object, without any signing.
    fn native_url(&self, key: &str) -> StorageResult<String>;

    /// Mint a presigned URL with optional response-header overrides.
    ///
    /// Only object-storage backends support this.
    async fn presigned_url(&self, _key: &str, _options: PresignOptions) -> StorageResult<String> {
        Err(StorageError::UrlNotSupported(
            self.backend_kind().to_string(),
        ))
    }

    /// Static identifier for the backend type (e.g. "filesystem", "s3").
    /// Used for logging.
    fn backend_kind(&self) -> &'static str;

    /// Whether a key is acceptable to this backend.
    ///
    /// The default rejects empty keys, absolute paths, and traversal
    /// components.
    fn valid_key(&self, key: &str) -> bool {
        !key.is_empty()
            && !key.starts_with('/')
            && !key.starts_with('\\')
            && !key.split(['/', '\\']).any(|part| part.is_empty() || part == "." || part == "..")
    }

    /// Verify the backend is reachable and usable.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
