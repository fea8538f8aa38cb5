//! Attachment repository.

use crate::error::MetadataResult;
use crate::models::Attachment;
use async_trait::async_trait;

/// Repository for attachment rows.
#[async_trait]
pub trait AttachmentRepo: Send + Sync {
    /// Insert an attachment row.
    async fn create_attachment(&self, attachment: &Attachment) -> MetadataResult<()>;

    /// Attachments on one record slot, ordered by position then creation.
    async fn attachments_for(
        &self,
        record_type: &str,
        record_id: &str,
        name: &str,
    ) -> MetadataResult<Vec<Attachment>>;

    /// Delete an attachment row. Deleting a missing row is not an error.
    async fn delete_attachment(&self, id: &str) -> MetadataResult<()>;
}
