//! Application configuration.
//!
//! Everything is explicit: the service carries its defaults in a config struct
//! passed by reference, never in process-global state. Binaries load this with
//! figment (TOML file plus `HOLDFAST_`-prefixed environment).

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use holdfast_signer::SecretConfig;

use crate::error::{Error, Result};

/// Top-level application configuration.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    pub signing: SigningConfig,
    /// Named storage backends. The name is what blob rows record.
    pub backends: HashMap<String, StorageConfig>,
    pub metadata: MetadataConfig,
}

impl AppConfig {
    /// Validate cross-field constraints not expressible in serde.
    pub fn validate(&self) -> Result<()> {
        if self.backends.is_empty() {
            return Err(Error::Config("at least one storage backend is required".into()));
        }
        if !self.backends.contains_key(&self.service.default_backend) {
            return Err(Error::Config(format!(
                "default backend '{}' is not configured",
                self.service.default_backend
            )));
        }
        for (name, backend) in &self.backends {
            backend
                .validate()
                .map_err(|e| Error::Config(format!("backend '{name}': {e}")))?;
        }
        Ok(())
    }

    /// Configuration for tests: one filesystem backend rooted at `root`, an
    /// in-memory metadata store, and a generated signing secret.
    pub fn for_testing(root: impl Into<PathBuf>) -> Self {
        let mut backends = HashMap::new();
        backends.insert(
            "default".to_string(),
            StorageConfig::Filesystem {
                root: root.into(),
                url: default_filesystem_url_kind(),
            },
        );
        Self {
            server: ServerConfig::default(),
            service: ServiceConfig::default(),
            signing: SigningConfig {
                secret: SecretConfig::Generate,
            },
            backends,
            metadata: MetadataConfig::Memory,
        }
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

fn default_bind() -> SocketAddr {
    "127.0.0.1:8405".parse().expect("valid default bind address")
}

/// Service-level defaults applied when callers do not specify a value.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Backend name new blobs are stored in.
    #[serde(default = "default_backend")]
    pub default_backend: String,
    /// MIME type when nothing better can be determined.
    #[serde(default = "default_mime_type")]
    pub default_mime_type: String,
    /// Lifetime of signed filesystem-serving URLs, in seconds.
    #[serde(default = "default_file_system_url_expiry_secs")]
    pub file_system_url_expiry_secs: u64,
    /// Which image processor performs transformations.
    #[serde(default)]
    pub image_processor: ProcessorKind,
    /// Record processed variants in the metadata store (probe by row instead
    /// of a storage round-trip).
    #[serde(default = "default_track_variants")]
    pub track_variants: bool,
    /// Output format merged into variations that do not request one.
    #[serde(default = "default_variant_format")]
    pub default_variant_format: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_backend: default_backend(),
            default_mime_type: default_mime_type(),
            file_system_url_expiry_secs: default_file_system_url_expiry_secs(),
            image_processor: ProcessorKind::default(),
            track_variants: default_track_variants(),
            default_variant_format: default_variant_format(),
        }
    }
}

fn default_backend() -> String {
    "default".to_string()
}

fn default_mime_type() -> String {
    "application/octet-stream".to_string()
}

fn default_file_system_url_expiry_secs() -> u64 {
    3600
}

fn default_track_variants() -> bool {
    true
}

fn default_variant_format() -> String {
    "webp".to_string()
}

/// Image processor selection.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorKind {
    /// In-process pixel operations via the `image` crate.
    #[default]
    Pixel,
}

impl ProcessorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorKind::Pixel => "pixel",
        }
    }
}

/// Signing secret configuration.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SigningConfig {
    pub secret: SecretConfig,
}

/// One named storage backend.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageConfig {
    Filesystem {
        root: PathBuf,
        /// How URLs for objects in this backend are generated.
        #[serde(default = "default_filesystem_url_kind")]
        url: UrlKind,
    },
    S3 {
        bucket: String,
        #[serde(default)]
        region: Option<String>,
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        prefix: Option<String>,
        #[serde(default)]
        force_path_style: bool,
        #[serde(default = "default_s3_url_kind")]
        url: UrlKind,
    },
    /// In-process store. Tests and embedded setups only.
    Memory {
        #[serde(default = "default_memory_url_kind")]
        url: UrlKind,
    },
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        match self {
            StorageConfig::Filesystem { root, .. } => {
                if root.as_os_str().is_empty() {
                    return Err(Error::Config("filesystem root must not be empty".into()));
                }
            }
            StorageConfig::S3 { bucket, .. } => {
                if bucket.is_empty() {
                    return Err(Error::Config("s3 bucket must not be empty".into()));
                }
            }
            StorageConfig::Memory { .. } => {}
        }
        Ok(())
    }

    pub fn url_kind(&self) -> UrlKind {
        match self {
            StorageConfig::Filesystem { url, .. }
            | StorageConfig::S3 { url, .. }
            | StorageConfig::Memory { url } => *url,
        }
    }
}

/// URL generation strategy for a backend, fixed at config load.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlKind {
    /// The backend's own unsigned URL.
    Native,
    /// Signed, expiring `/disk/...` URLs served by this application.
    FileSystem,
    /// Presigned URLs minted by the object store.
    ObjectStorage,
}

fn default_filesystem_url_kind() -> UrlKind {
    UrlKind::FileSystem
}

fn default_s3_url_kind() -> UrlKind {
    UrlKind::ObjectStorage
}

fn default_memory_url_kind() -> UrlKind {
    UrlKind::FileSystem
}

/// Metadata store selection.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetadataConfig {
    Sqlite { path: PathBuf },
    Memory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_testing_validates() {
        let config = AppConfig::for_testing("/tmp/holdfast-test");
        config.validate().unwrap();
        assert_eq!(config.service.default_backend, "default");
        assert_eq!(config.service.default_variant_format, "webp");
        assert!(config.service.track_variants);
    }

    #[test]
    fn test_missing_default_backend_rejected() {
        let mut config = AppConfig::for_testing("/tmp/holdfast-test");
        config.service.default_backend = "missing".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_filesystem_root_rejected() {
        let mut config = AppConfig::for_testing("");
        assert!(config.validate().is_err());
        config.backends.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_minimal_toml_shape() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "signing": {"secret": {"source": "generate"}},
            "backends": {
                "default": {"type": "filesystem", "root": "/var/lib/holdfast"},
                "archive": {"type": "s3", "bucket": "holdfast-archive"}
            },
            "metadata": {"type": "sqlite", "path": "/var/lib/holdfast/meta.db"}
        }))
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.service.default_mime_type, "application/octet-stream");
        assert_eq!(config.service.file_system_url_expiry_secs, 3600);
        assert_eq!(config.service.image_processor, ProcessorKind::Pixel);
        assert_eq!(
            config.backends["default"].url_kind(),
            UrlKind::FileSystem
        );
        assert_eq!(
            config.backends["archive"].url_kind(),
            UrlKind::ObjectStorage
        );
    }
}
