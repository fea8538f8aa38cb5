//! Rows stored alongside blobs.
//!
//! The blob row itself is `holdfast_core::Blob`; these are the records that
//! tie blobs to application data.

use time::OffsetDateTime;

use holdfast_core::keys::generate_pk;

/// Joins a blob to an application record under a name, with an ordering
/// position for multi-file attachments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub id: String,
    pub blob_id: String,
    /// The owning record's type, e.g. `"Recipe"`.
    pub record_type: String,
    pub record_id: String,
    /// Attachment slot name on the record, e.g. `"photos"`.
    pub name: String,
    pub position: i64,
    pub created_at: OffsetDateTime,
}

impl Attachment {
    pub fn new(
        blob_id: impl Into<String>,
        record_type: impl Into<String>,
        record_id: impl Into<String>,
        name: impl Into<String>,
        position: i64,
    ) -> Self {
        Self {
            id: generate_pk(),
            blob_id: blob_id.into(),
            record_type: record_type.into(),
            record_id: record_id.into(),
            name: name.into(),
            position,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Marks a processed variant of a source blob.
///
/// `(blob_id, variation_digest)` is unique; `image_blob_id` points at the
/// blob row describing the derived image's bytes, once processing filled it
/// in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariantRecord {
    pub id: String,
    pub blob_id: String,
    pub variation_digest: String,
    pub image_blob_id: Option<String>,
    pub created_at: OffsetDateTime,
}

impl VariantRecord {
    pub fn new(blob_id: impl Into<String>, variation_digest: impl Into<String>) -> Self {
        Self {
            id: generate_pk(),
            blob_id: blob_id.into(),
            variation_digest: variation_digest.into(),
            image_blob_id: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}
