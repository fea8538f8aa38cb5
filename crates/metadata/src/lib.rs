//! Metadata persistence for Holdfast.
//!
//! Repository traits over blob rows, attachments, and variant records, with a
//! SQLite implementation and an in-memory one for tests and embedding.

pub mod error;
pub mod memory;
pub mod models;
pub mod repos;
pub mod store;

use std::sync::Arc;

use holdfast_core::MetadataConfig;

pub use error::{MetadataError, MetadataResult};
pub use memory::MemoryStore;
pub use models::{Attachment, VariantRecord};
pub use repos::{AttachmentRepo, BlobRepo, VariantRecordRepo};
pub use store::{MetadataStore, SqliteStore};

/// Open the configured metadata store.
pub async fn open(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    match config {
        MetadataConfig::Sqlite { path } => Ok(Arc::new(SqliteStore::new(path).await?)),
        MetadataConfig::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
