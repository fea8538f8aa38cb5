//! Storage backends and URL generation for Holdfast.
//!
//! Blob bytes live behind the [`ObjectStore`] trait. Named backend
//! configurations resolve once at startup into a [`BackendRegistry`] pairing
//! each store with its [`UrlGenerator`] strategy.

pub mod backends;
pub mod error;
pub mod registry;
pub mod traits;
pub mod urls;

pub use backends::{FilesystemBackend, MemoryBackend, S3Backend};
pub use error::{StorageError, StorageResult};
pub use registry::{BackendHandle, BackendRegistry};
pub use traits::{ByteStream, ObjectStore, PresignOptions};
pub use urls::{
    content_disposition, DispositionKind, FileToken, UrlGenerator, UrlOptions,
    FILE_SYSTEM_PURPOSE,
};
