//! Attaching uploaded content to application records.

use bytes::Bytes;
use tracing::debug;

use holdfast_core::Blob;
use holdfast_metadata::{Attachment, AttachmentRepo, BlobRepo};
use holdfast_storage::ObjectStore;

use crate::blobs;
use crate::error::MediaResult;
use crate::variant::MediaContext;

/// Options for [`attach`].
#[derive(Clone, Debug, Default)]
pub struct AttachOptions {
    /// Reuse an existing blob row when one with identical content already
    /// exists in the target backend.
    pub dedup: bool,
    /// Ordering position within the attachment slot.
    pub position: i64,
}

/// Store content and join it to a record slot.
///
/// With `dedup`, byte-identical content (same checksum, size, and backend)
/// shares one blob row across any number of attachments; without it, every
/// call creates a fresh blob row and storage object.
pub async fn attach(
    ctx: &MediaContext,
    store: &dyn ObjectStore,
    record_type: &str,
    record_id: &str,
    name: &str,
    filename: &str,
    bytes: Bytes,
    options: AttachOptions,
) -> MediaResult<(Blob, Attachment)> {
    let mut candidate = Blob::new(&ctx.service);
    candidate.unfurl(filename, &bytes, &ctx.service.default_mime_type);

    let blob = if options.dedup {
        let existing = ctx
            .metadata
            .find_blob_by_checksum(
                candidate.checksum.as_deref().unwrap_or_default(),
                candidate.byte_size.unwrap_or_default(),
                &candidate.backend,
            )
            .await?;
        match existing {
            Some(found) => {
                debug!(blob = %found.id, "reusing existing blob for identical content");
                found
            }
            None => {
                blobs::upload(ctx, store, &mut candidate, filename, bytes).await?;
                ctx.metadata.create_blob(&candidate).await?;
                candidate
            }
        }
    } else {
        blobs::upload(ctx, store, &mut candidate, filename, bytes).await?;
        ctx.metadata.create_blob(&candidate).await?;
        candidate
    };

    let attachment = Attachment::new(&blob.id, record_type, record_id, name, options.position);
    ctx.metadata.create_attachment(&attachment).await?;

    Ok((blob, attachment))
}
