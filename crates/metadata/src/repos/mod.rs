//! Repository trait definitions.

mod attachments;
mod blobs;
mod variant_records;

pub use attachments::AttachmentRepo;
pub use blobs::BlobRepo;
pub use variant_records::VariantRecordRepo;
