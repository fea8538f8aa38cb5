//! Variants: derived images cached at deterministic keys.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use holdfast_core::checksum::checksum_bytes;
use holdfast_core::{Blob, ServiceConfig, Variation, VariationInput, FORMAT_KEY};
use holdfast_metadata::{BlobRepo, MetadataStore, VariantRecordRepo};
use holdfast_signer::TokenSigner;
use holdfast_storage::{BackendHandle, ObjectStore, UrlOptions};

use crate::error::{MediaError, MediaResult};
use crate::processor::build_processor;
use crate::transformer::Transformer;

/// How processed-variant existence is probed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariantTracking {
    /// Ask the storage backend whether the derived object exists.
    Storage,
    /// Consult variant record rows; no storage round-trip.
    Records,
}

/// Shared service context for media operations.
#[derive(Clone)]
pub struct MediaContext {
    pub service: ServiceConfig,
    pub signer: TokenSigner,
    pub metadata: Arc<dyn MetadataStore>,
}

impl MediaContext {
    pub fn new(
        service: ServiceConfig,
        signer: TokenSigner,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        Self {
            service,
            signer,
            metadata,
        }
    }

    pub fn tracking(&self) -> VariantTracking {
        if self.service.track_variants {
            VariantTracking::Records
        } else {
            VariantTracking::Storage
        }
    }
}

/// Build a variant for a blob, merging in the configured default output
/// format. Fails for blobs no representation can be derived from.
pub fn representation(
    ctx: &MediaContext,
    blob: Blob,
    input: impl Into<VariationInput>,
) -> MediaResult<Variant> {
    if !blob.is_variable() {
        return Err(MediaError::NotRepresentable {
            mime_type: blob.mime_type.clone(),
        });
    }
    let mut defaults = Map::new();
    defaults.insert(
        FORMAT_KEY.to_string(),
        Value::String(ctx.service.default_variant_format.clone()),
    );
    let variation = Variation::wrap(input, &ctx.signer)?.default_to(&defaults);
    Ok(Variant { blob, variation })
}

/// One derived image: a source blob plus a variation.
#[derive(Clone, Debug)]
pub struct Variant {
    pub blob: Blob,
    pub variation: Variation,
}

impl Variant {
    /// Deterministic storage key for the derived image:
    /// `variants/<source key>/<base58(sha256(variation key))>`.
    ///
    /// The variation key is a signed value, so derived keys are stable per
    /// signing secret but not guessable without it.
    pub fn key(&self, signer: &TokenSigner) -> MediaResult<String> {
        let variation_key = self.variation.key(signer)?;
        let mut hasher = Sha256::new();
        hasher.update(variation_key.as_bytes());
        let digest = bs58::encode(hasher.finalize()).into_string();
        Ok(format!("variants/{}/{digest}", self.blob.key))
    }

    /// Display filename for the derived image: the source filename's stem
    /// with the variation's output format as extension.
    pub fn filename(&self) -> String {
        let stem = self
            .blob
            .filename
            .as_deref()
            .map(|name| name.rsplit_once('.').map_or(name, |(stem, _)| stem))
            .unwrap_or("file");
        format!("{stem}.{}", self.variation.output_format())
    }

    /// Run the transformation pipeline and cache the result at the derived
    /// key. Returns the transformed bytes.
    ///
    /// Safe to call concurrently: the output is byte-identical per variation
    /// and the storage write is an atomic replace, so duplicate work is
    /// tolerated without locking.
    pub async fn process(
        &self,
        ctx: &MediaContext,
        store: &dyn ObjectStore,
    ) -> MediaResult<Bytes> {
        if !self.blob.is_variable() {
            return Err(MediaError::NotRepresentable {
                mime_type: self.blob.mime_type.clone(),
            });
        }

        let source = store.get(&self.blob.key).await?;
        let mut processor = build_processor(ctx.service.image_processor);
        let output = Transformer::new(&self.variation).process(&source, processor.as_mut())?;

        let key = self.key(&ctx.signer)?;
        store.put(&key, output.clone()).await?;
        info!(blob = %self.blob.id, key = %key, size = output.len(), "processed variant");

        if ctx.tracking() == VariantTracking::Records {
            let digest = self.variation.digest()?;
            let record = ctx
                .metadata
                .get_or_create_variant_record(&self.blob.id, &digest)
                .await?;
            if record.image_blob_id.is_none() {
                let mut image = Blob::with_key(&ctx.service, key.clone());
                image.backend = self.blob.backend.clone();
                image.mime_type = self
                    .variation
                    .mime_type(&ctx.service.default_mime_type);
                image.byte_size = Some(output.len() as u64);
                image.checksum = Some(checksum_bytes(&output));
                image.filename = Some(self.filename());
                // Concurrent first-time processing can reach this insert
                // twice; the key-level upsert returns whichever row won and
                // both callers record the same image blob id.
                let image = ctx.metadata.create_blob_if_absent(&image).await?;
                ctx.metadata
                    .set_variant_record_image(&record.id, &image.id)
                    .await?;
            }
        }

        Ok(output)
    }

    /// Whether the derived image already exists, per the configured probe.
    pub async fn is_processed(
        &self,
        ctx: &MediaContext,
        store: &dyn ObjectStore,
    ) -> MediaResult<bool> {
        match ctx.tracking() {
            VariantTracking::Storage => {
                let key = self.key(&ctx.signer)?;
                Ok(store.exists(&key).await?)
            }
            VariantTracking::Records => {
                let digest = self.variation.digest()?;
                let record = ctx
                    .metadata
                    .get_variant_record(&self.blob.id, &digest)
                    .await?;
                Ok(record.is_some_and(|r| r.image_blob_id.is_some()))
            }
        }
    }

    /// Process only if not already processed; discards the bytes.
    pub async fn ensure_processed(
        &self,
        ctx: &MediaContext,
        store: &dyn ObjectStore,
    ) -> MediaResult<()> {
        if self.is_processed(ctx, store).await? {
            debug!(blob = %self.blob.id, "variant already processed");
            return Ok(());
        }
        self.process(ctx, store).await?;
        Ok(())
    }

    /// URL for the derived image, declaring the variation's MIME type.
    pub async fn url(&self, ctx: &MediaContext, handle: &BackendHandle) -> MediaResult<String> {
        let key = self.key(&ctx.signer)?;
        let url = handle
            .urls
            .url(
                handle.store.as_ref(),
                &ctx.signer,
                &key,
                UrlOptions {
                    filename: Some(self.filename()),
                    mime_type: Some(
                        self.variation.mime_type(&ctx.service.default_mime_type),
                    ),
                    ..UrlOptions::default()
                },
            )
            .await?;
        Ok(url)
    }

    /// Remove the derived image and any tracking rows. Idempotent.
    pub async fn delete(&self, ctx: &MediaContext, store: &dyn ObjectStore) -> MediaResult<()> {
        let key = self.key(&ctx.signer)?;
        store.delete(&key).await?;

        if ctx.tracking() == VariantTracking::Records {
            let digest = self.variation.digest()?;
            if let Some(record) = ctx
                .metadata
                .get_variant_record(&self.blob.id, &digest)
                .await?
            {
                if let Some(image_blob_id) = &record.image_blob_id {
                    ctx.metadata.delete_blob(image_blob_id).await?;
                }
                ctx.metadata.delete_variant_record(&record.id).await?;
            }
        }
        Ok(())
    }
}
