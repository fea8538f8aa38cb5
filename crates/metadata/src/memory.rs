//! In-memory metadata store for tests and embedded use.

use crate::error::{MetadataError, MetadataResult};
use crate::models::{Attachment, VariantRecord};
use crate::repos::{AttachmentRepo, BlobRepo, VariantRecordRepo};
use crate::store::MetadataStore;
use async_trait::async_trait;
use holdfast_core::Blob;
use std::collections::HashMap;
use std::sync::RwLock;
use time::OffsetDateTime;

#[derive(Default)]
struct Inner {
    blobs: HashMap<String, Blob>,
    attachments: HashMap<String, Attachment>,
    variant_records: HashMap<String, VariantRecord>,
}

/// Metadata store holding everything in process-local maps.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn migrate(&self) -> MetadataResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        Ok(())
    }
}

#[async_trait]
impl BlobRepo for MemoryStore {
    async fn create_blob(&self, blob: &Blob) -> MetadataResult<()> {
        self.inner
            .write()
            .expect("lock poisoned")
            .blobs
            .insert(blob.id.clone(), blob.clone());
        Ok(())
    }

    async fn create_blob_if_absent(&self, blob: &Blob) -> MetadataResult<Blob> {
        let mut inner = self.inner.write().expect("lock poisoned");
        if let Some(existing) = inner.blobs.values().find(|b| b.key == blob.key) {
            return Ok(existing.clone());
        }
        inner.blobs.insert(blob.id.clone(), blob.clone());
        Ok(blob.clone())
    }

    async fn get_blob(&self, id: &str) -> MetadataResult<Option<Blob>> {
        Ok(self.inner.read().expect("lock poisoned").blobs.get(id).cloned())
    }

    async fn get_blob_by_key(&self, key: &str) -> MetadataResult<Option<Blob>> {
        Ok(self
            .inner
            .read()
            .expect("lock poisoned")
            .blobs
            .values()
            .find(|b| b.key == key)
            .cloned())
    }

    async fn update_blob(&self, blob: &Blob) -> MetadataResult<()> {
        let mut inner = self.inner.write().expect("lock poisoned");
        if inner.blobs.contains_key(&blob.id) {
            inner.blobs.insert(blob.id.clone(), blob.clone());
        }
        Ok(())
    }

    async fn delete_blob(&self, id: &str) -> MetadataResult<()> {
        self.inner.write().expect("lock poisoned").blobs.remove(id);
        Ok(())
    }

    async fn find_blob_by_checksum(
        &self,
        checksum: &str,
        byte_size: u64,
        backend: &str,
    ) -> MetadataResult<Option<Blob>> {
        Ok(self
            .inner
            .read()
            .expect("lock poisoned")
            .blobs
            .values()
            .find(|b| {
                b.checksum.as_deref() == Some(checksum)
                    && b.byte_size == Some(byte_size)
                    && b.backend == backend
            })
            .cloned())
    }

    async fn unattached_blobs(
        &self,
        created_before: Option<OffsetDateTime>,
    ) -> MetadataResult<Vec<Blob>> {
        let inner = self.inner.read().expect("lock poisoned");
        let mut result: Vec<Blob> = inner
            .blobs
            .values()
            .filter(|b| {
                !inner.attachments.values().any(|a| a.blob_id == b.id)
                    && !inner
                        .variant_records
                        .values()
                        .any(|v| v.image_blob_id.as_deref() == Some(b.id.as_str()))
                    && created_before.is_none_or(|cutoff| b.created_at < cutoff)
            })
            .cloned()
            .collect();
        result.sort_by_key(|b| b.created_at);
        Ok(result)
    }
}

#[async_trait]
impl AttachmentRepo for MemoryStore {
    async fn create_attachment(&self, attachment: &Attachment) -> MetadataResult<()> {
        self.inner
            .write()
            .expect("lock poisoned")
            .attachments
            .insert(attachment.id.clone(), attachment.clone());
        Ok(())
    }

    async fn attachments_for(
        &self,
        record_type: &str,
        record_id: &str,
        name: &str,
    ) -> MetadataResult<Vec<Attachment>> {
        let inner = self.inner.read().expect("lock poisoned");
        let mut result: Vec<Attachment> = inner
            .attachments
            .values()
            .filter(|a| a.record_type == record_type && a.record_id == record_id && a.name == name)
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(result)
    }

    async fn delete_attachment(&self, id: &str) -> MetadataResult<()> {
        self.inner
            .write()
            .expect("lock poisoned")
            .attachments
            .remove(id);
        Ok(())
    }
}

#[async_trait]
impl VariantRecordRepo for MemoryStore {
    async fn get_variant_record(
        &self,
        blob_id: &str,
        variation_digest: &str,
    ) -> MetadataResult<Option<VariantRecord>> {
        Ok(self
            .inner
            .read()
            .expect("lock poisoned")
            .variant_records
            .values()
            .find(|v| v.blob_id == blob_id && v.variation_digest == variation_digest)
            .cloned())
    }

    async fn get_or_create_variant_record(
        &self,
        blob_id: &str,
        variation_digest: &str,
    ) -> MetadataResult<VariantRecord> {
        let mut inner = self.inner.write().expect("lock poisoned");
        if let Some(existing) = inner
            .variant_records
            .values()
            .find(|v| v.blob_id == blob_id && v.variation_digest == variation_digest)
        {
            return Ok(existing.clone());
        }
        let fresh = VariantRecord::new(blob_id, variation_digest);
        inner
            .variant_records
            .insert(fresh.id.clone(), fresh.clone());
        Ok(fresh)
    }

    async fn set_variant_record_image(
        &self,
        id: &str,
        image_blob_id: &str,
    ) -> MetadataResult<()> {
        let mut inner = self.inner.write().expect("lock poisoned");
        let record = inner
            .variant_records
            .get_mut(id)
            .ok_or_else(|| MetadataError::NotFound(format!("variant record {id}")))?;
        record.image_blob_id = Some(image_blob_id.to_string());
        Ok(())
    }

    async fn delete_variant_record(&self, id: &str) -> MetadataResult<()> {
        self.inner
            .write()
            .expect("lock poisoned")
            .variant_records
            .remove(id);
        Ok(())
    }

    async fn delete_variant_records_for_blob(
        &self,
        blob_id: &str,
    ) -> MetadataResult<Vec<VariantRecord>> {
        let mut inner = self.inner.write().expect("lock poisoned");
        let ids: Vec<String> = inner
            .variant_records
            .values()
            .filter(|v| v.blob_id == blob_id)
            .map(|v| v.id.clone())
            .collect();
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = inner.variant_records.remove(&id) {
                removed.push(record);
            }
        }
        Ok(removed)
    }
}
