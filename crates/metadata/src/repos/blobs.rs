//! Blob repository.

use crate::error::MetadataResult;
use async_trait::async_trait;
use holdfast_core::Blob;
use time::OffsetDateTime;

/// Repository for blob rows.
#[async_trait]
pub trait BlobRepo: Send + Sync {
    /// Insert a blob row.
    async fn create_blob(&self, blob: &Blob) -> MetadataResult<()>;

    /// Insert a blob row unless one already holds the same key; returns the
    /// row owning the key afterwards. Safe under concurrent callers racing to
    /// record the same derived object.
    async fn create_blob_if_absent(&self, blob: &Blob) -> MetadataResult<Blob>;

    /// Get a blob by id.
    async fn get_blob(&self, id: &str) -> MetadataResult<Option<Blob>>;

    /// Get a blob by storage key.
    async fn get_blob_by_key(&self, key: &str) -> MetadataResult<Option<Blob>>;

    /// Replace a blob row's mutable fields.
    async fn update_blob(&self, blob: &Blob) -> MetadataResult<()>;

    /// Delete a blob row. Deleting a missing row is not an error.
    async fn delete_blob(&self, id: &str) -> MetadataResult<()>;

    /// Find an existing blob with identical content in the same backend.
    /// Used for upload deduplication.
    async fn find_blob_by_checksum(
        &self,
        checksum: &str,
        byte_size: u64,
        backend: &str,
    ) -> MetadataResult<Option<Blob>>;

    /// Blobs with no attachment rows that are not a variant record's derived
    /// image, optionally restricted to rows created before a cutoff.
    async fn unattached_blobs(
        &self,
        created_before: Option<OffsetDateTime>,
    ) -> MetadataResult<Vec<Blob>>;
}
