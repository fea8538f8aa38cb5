//! Backend registry: named backend configs resolved once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use time::Duration;
use tracing::info;

use holdfast_core::{ServiceConfig, StorageConfig, UrlKind};

use crate::backends::{FilesystemBackend, MemoryBackend, S3Backend};
use crate::error::{StorageError, StorageResult};
use crate::traits::ObjectStore;
use crate::urls::UrlGenerator;

/// One resolved backend: its store and its URL strategy.
#[derive(Clone)]
pub struct BackendHandle {
    pub store: Arc<dyn ObjectStore>,
    pub urls: UrlGenerator,
}

/// All configured backends, resolved to concrete stores and URL generators.
pub struct BackendRegistry {
    backends: HashMap<String, BackendHandle>,
}

impl BackendRegistry {
    /// Build every configured backend. Fails fast on any misconfiguration;
    /// nothing is resolved lazily afterwards.
    pub async fn from_config(
        configs: &HashMap<String, StorageConfig>,
        service: &ServiceConfig,
    ) -> StorageResult<Self> {
        let expiry = Duration::seconds(service.file_system_url_expiry_secs as i64);
        let mut backends = HashMap::new();

        for (name, config) in configs {
            let store: Arc<dyn ObjectStore> = match config {
                StorageConfig::Filesystem { root, .. } => {
                    Arc::new(FilesystemBackend::new(root).await?)
                }
                StorageConfig::S3 {
                    bucket,
                    region,
                    endpoint,
                    prefix,
                    force_path_style,
                    ..
                } => Arc::new(
                    S3Backend::new(
                        bucket,
                        region.clone(),
                        endpoint.clone(),
                        prefix.clone(),
                        *force_path_style,
                    )
                    .await?,
                ),
                StorageConfig::Memory { .. } => Arc::new(MemoryBackend::new()),
            };

            let urls = match config.url_kind() {
                UrlKind::Native => UrlGenerator::Native,
                UrlKind::FileSystem => UrlGenerator::FileSystem {
                    backend: name.clone(),
                    expiry,
                },
                UrlKind::ObjectStorage => UrlGenerator::ObjectStorage { expiry },
            };

            info!(backend = %name, kind = store.backend_kind(), "configured storage backend");
            backends.insert(name.clone(), BackendHandle { store, urls });
        }

        Ok(Self { backends })
    }

    /// Registry with a single memory backend named `default`. Tests only.
    pub fn for_testing() -> Self {
        let mut backends = HashMap::new();
        backends.insert(
            "default".to_string(),
            BackendHandle {
                store: Arc::new(MemoryBackend::new()),
                urls: UrlGenerator::FileSystem {
                    backend: "default".to_string(),
                    expiry: Duration::hours(1),
                },
            },
        );
        Self { backends }
    }

    /// Look up a backend by name.
    pub fn get(&self, name: &str) -> StorageResult<&BackendHandle> {
        self.backends
            .get(name)
            .ok_or_else(|| StorageError::UnknownBackend(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.backends.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_from_config_resolves_backends() {
        let dir = tempfile::tempdir().unwrap();
        let mut configs = HashMap::new();
        configs.insert(
            "default".to_string(),
            StorageConfig::Filesystem {
                root: dir.path().to_path_buf(),
                url: UrlKind::FileSystem,
            },
        );
        configs.insert(
            "scratch".to_string(),
            StorageConfig::Memory {
                url: UrlKind::FileSystem,
            },
        );

        let registry = BackendRegistry::from_config(&configs, &ServiceConfig::default())
            .await
            .unwrap();

        let handle = registry.get("default").unwrap();
        assert_eq!(handle.store.backend_kind(), "filesystem");
        handle
            .store
            .put("probe", Bytes::from("x"))
            .await
            .unwrap();
        assert!(handle.store.exists("probe").await.unwrap());

        assert_eq!(registry.get("scratch").unwrap().store.backend_kind(), "memory");
        assert!(matches!(
            registry.get("missing"),
            Err(StorageError::UnknownBackend(_))
        ));
    }
}
