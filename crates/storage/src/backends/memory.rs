//! In-memory storage backend for tests and embedded setups.

use crate::error::{StorageError, StorageResult};
use crate::traits::{ByteStream, ObjectStore};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::instrument;

/// Object store holding everything in a process-local map.
#[derive(Default)]
pub struct MemoryBackend {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryBackend {
    #[instrument(skip(self), fields(backend = "memory"))]
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.objects.read().expect("lock poisoned").contains_key(key))
    }

    #[instrument(skip(self), fields(backend = "memory"))]
    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.objects
            .read()
            .expect("lock poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    #[instrument(skip(self), fields(backend = "memory"))]
    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream> {
        let data = self.get(key).await?;
        Ok(Box::pin(futures::stream::once(async move { Ok(data) })))
    }

    #[instrument(skip(self, data), fields(backend = "memory", size = data.len()))]
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        if !self.valid_key(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        self.objects
            .write()
            .expect("lock poisoned")
            .insert(key.to_string(), data);
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "memory"))]
    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.objects.write().expect("lock poisoned").remove(key);
        Ok(())
    }

    fn native_url(&self, _key: &str) -> StorageResult<String> {
        Err(StorageError::UrlNotSupported("memory".to_string()))
    }

    fn backend_kind(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip_and_idempotent_delete() {
        let backend = MemoryBackend::new();
        backend.put("a/b", Bytes::from("data")).await.unwrap();
        assert!(backend.exists("a/b").await.unwrap());
        assert_eq!(backend.get("a/b").await.unwrap(), Bytes::from("data"));

        backend.delete("a/b").await.unwrap();
        backend.delete("a/b").await.unwrap();
        assert!(matches!(
            backend.get("a/b").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let backend = MemoryBackend::new();
        assert!(backend.put("", Bytes::new()).await.is_err());
        assert!(backend.put("../x", Bytes::new()).await.is_err());
    }
}
