//! The blob entity: one stored file's identity and metadata.
//!
//! A blob row describes bytes living in a named storage backend under `key`.
//! The entity itself is pure; moving bytes in and out of storage is the media
//! layer's job.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use holdfast_signer::{SignOptions, TokenSigner};

use crate::checksum::checksum_bytes;
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::keys::{generate_key, generate_pk, key_with_prefix, sanitize_filename};
use crate::mime;

/// Metadata key under which application-supplied values live.
const CUSTOM_METADATA_KEY: &str = "custom";

/// Broad classification of a blob's content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentKind {
    Image,
    Other,
}

/// One stored file.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Blob {
    /// Fixed-width base58 primary id.
    pub id: String,
    /// Storage key within the backend. Never empty.
    pub key: String,
    /// Sanitized original filename, if one was provided.
    pub filename: Option<String>,
    pub mime_type: String,
    /// Name of the storage backend holding the bytes.
    pub backend: String,
    pub byte_size: Option<u64>,
    /// MD5 checksum, URL-safe base64. Integrity and dedup only.
    pub checksum: Option<String>,
    /// Open metadata map. The `custom` sub-map is reserved for applications.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub created_at: OffsetDateTime,
}

impl Blob {
    /// New blob with a fresh id and key, carrying the service defaults.
    pub fn new(service: &ServiceConfig) -> Self {
        Self::with_key(service, generate_key())
    }

    /// New blob at a caller-chosen storage key.
    pub fn with_key(service: &ServiceConfig, key: impl Into<String>) -> Self {
        Self {
            id: generate_pk(),
            key: key.into(),
            filename: None,
            mime_type: service.default_mime_type.clone(),
            backend: service.default_backend.clone(),
            byte_size: None,
            checksum: None,
            metadata: Map::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// New blob with a timestamp-prefixed key, e.g. `2026/08/<key>` for the
    /// template `"[year]/[month]"`.
    pub fn with_key_prefix(service: &ServiceConfig, template: &str) -> Result<Self> {
        Ok(Self::with_key(service, key_with_prefix(template)?))
    }

    /// Populate filename, MIME type, size, and checksum from content in one
    /// step. Pure; does not touch storage.
    pub fn unfurl(&mut self, filename: &str, bytes: &[u8], default_mime: &str) {
        let filename = sanitize_filename(filename);
        self.mime_type = mime::guess(&filename, default_mime);
        self.byte_size = Some(bytes.len() as u64);
        self.checksum = Some(checksum_bytes(bytes));
        self.filename = Some(filename);
    }

    /// Tamper-evident encoding of this blob's storage key for use in URLs.
    /// Holders resolve it with a get-by-key lookup.
    pub fn signed_id(&self, signer: &TokenSigner) -> Result<String> {
        self.signed_id_with(signer, SignOptions::default())
    }

    /// Signed id with explicit options (expiry, purpose).
    pub fn signed_id_with(&self, signer: &TokenSigner, options: SignOptions<'_>) -> Result<String> {
        Ok(signer.sign(&self.key, options)?)
    }

    /// Recover a storage key from a signed id token.
    pub fn unsign_key(signer: &TokenSigner, token: &str, purpose: Option<&str>) -> Result<String> {
        Ok(signer.unsign(token, purpose)?)
    }

    pub fn content_kind(&self) -> ContentKind {
        if self.mime_type.starts_with("image/") {
            ContentKind::Image
        } else {
            ContentKind::Other
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_kind() == ContentKind::Image
    }

    /// Whether on-demand representations can be derived from this blob.
    pub fn is_variable(&self) -> bool {
        self.is_image()
    }

    /// Whether a preview image could be extracted from this blob's content.
    pub fn is_previewable(&self) -> bool {
        self.mime_type == "application/pdf" || self.mime_type.starts_with("video/")
    }

    /// Application-supplied metadata, if any was set.
    pub fn custom_metadata(&self) -> Option<&Map<String, Value>> {
        self.metadata.get(CUSTOM_METADATA_KEY).and_then(Value::as_object)
    }

    /// Set one application-supplied metadata entry.
    pub fn set_custom_metadata(&mut self, key: impl Into<String>, value: Value) {
        let custom = self
            .metadata
            .entry(CUSTOM_METADATA_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(map) = custom {
            map.insert(key.into(), value);
        }
    }
}
