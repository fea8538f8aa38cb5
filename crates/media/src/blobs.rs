//! Blob byte services: moving content in and out of storage.

use bytes::Bytes;
use tracing::info;

use holdfast_core::Blob;
use holdfast_metadata::{BlobRepo, VariantRecordRepo};
use holdfast_storage::ObjectStore;

use crate::error::MediaResult;
use crate::variant::{MediaContext, VariantTracking};

/// Populate the blob from content and write the bytes at its key.
///
/// Idempotent under retry: the same content lands at the same key and the
/// storage write is an atomic replace, so no existence check is needed.
pub async fn upload(
    ctx: &MediaContext,
    store: &dyn ObjectStore,
    blob: &mut Blob,
    filename: &str,
    bytes: Bytes,
) -> MediaResult<()> {
    blob.unfurl(filename, &bytes, &ctx.service.default_mime_type);
    store.put(&blob.key, bytes).await?;
    info!(blob = %blob.id, key = %blob.key, size = blob.byte_size, "uploaded blob");
    Ok(())
}

/// Read the blob's bytes.
pub async fn open(store: &dyn ObjectStore, blob: &Blob) -> MediaResult<Bytes> {
    Ok(store.get(&blob.key).await?)
}

/// Delete the blob's bytes and any record-tracked derived images.
///
/// Tolerant of already-missing objects. Row deletion for the blob itself is
/// a separate concern; callers purge bytes first, then delete the row.
pub async fn purge(
    ctx: &MediaContext,
    store: &dyn ObjectStore,
    blob: &Blob,
) -> MediaResult<()> {
    if ctx.tracking() == VariantTracking::Records {
        let records = ctx
            .metadata
            .delete_variant_records_for_blob(&blob.id)
            .await?;
        for record in records {
            if let Some(image_blob_id) = &record.image_blob_id {
                if let Some(image) = ctx.metadata.get_blob(image_blob_id).await? {
                    store.delete(&image.key).await?;
                }
                ctx.metadata.delete_blob(image_blob_id).await?;
            }
        }
    }

    store.delete(&blob.key).await?;
    info!(blob = %blob.id, key = %blob.key, "purged blob");
    Ok(())
}
