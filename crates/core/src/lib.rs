//! Core domain types for Holdfast.
//!
//! Holdfast stores application file attachments ("blobs") in pluggable
//! storage backends and serves them through signed, expiring URLs, with
//! on-demand derived image representations ("variants") cached at
//! deterministic keys. This crate holds the pure pieces: identifiers,
//! checksums, the blob and variation entities, and configuration. Storage,
//! persistence, and the media pipeline live in their own crates.

pub mod blob;
pub mod checksum;
pub mod config;
pub mod error;
pub mod keys;
pub mod mime;
pub mod variation;

pub use blob::{Blob, ContentKind};
pub use config::{
    AppConfig, MetadataConfig, ProcessorKind, ServerConfig, ServiceConfig, SigningConfig,
    StorageConfig, UrlKind,
};
pub use error::{Error, Result};
pub use variation::{Variation, VariationInput, FORMAT_KEY, VARIATION_PURPOSE};
