//! Variant record repository.

use crate::error::MetadataResult;
use crate::models::VariantRecord;
use async_trait::async_trait;

/// Repository for variant record rows.
#[async_trait]
pub trait VariantRecordRepo: Send + Sync {
    /// Get the record for a source blob and variation digest.
    async fn get_variant_record(
        &self,
        blob_id: &str,
        variation_digest: &str,
    ) -> MetadataResult<Option<VariantRecord>>;

    /// Get the record, inserting it first if it does not exist. Concurrent
    /// callers race on the unique `(blob_id, variation_digest)` index; the
    /// loser reads the winner's row.
    async fn get_or_create_variant_record(
        &self,
        blob_id: &str,
        variation_digest: &str,
    ) -> MetadataResult<VariantRecord>;

    /// Point a record at the blob row describing its derived image.
    async fn set_variant_record_image(
        &self,
        id: &str,
        image_blob_id: &str,
    ) -> MetadataResult<()>;

    /// Delete one record. Deleting a missing row is not an error.
    async fn delete_variant_record(&self, id: &str) -> MetadataResult<()>;

    /// Delete all records for a source blob, returning what was deleted so
    /// callers can purge the derived image blobs.
    async fn delete_variant_records_for_blob(
        &self,
        blob_id: &str,
    ) -> MetadataResult<Vec<VariantRecord>>;
}
