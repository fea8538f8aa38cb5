//! End-to-end media pipeline behavior against in-memory stores.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::{json, Map, Value};

use holdfast_core::{Blob, ServiceConfig};
use holdfast_media::{attach, blobs, representation, AttachOptions, MediaContext, MediaError};
use holdfast_metadata::{BlobRepo, MemoryStore, SqliteStore, VariantRecordRepo};
use holdfast_signer::TokenSigner;
use holdfast_storage::{MemoryBackend, ObjectStore};

const GARLIC_PNG: &[u8] = include_bytes!("fixtures/garlic.png");

fn context() -> MediaContext {
    MediaContext::new(
        ServiceConfig::default(),
        TokenSigner::new(b"test-secret".to_vec()),
        Arc::new(MemoryStore::new()),
    )
}

fn transformations(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

async fn uploaded_image(ctx: &MediaContext, store: &MemoryBackend) -> Blob {
    let mut blob = Blob::new(&ctx.service);
    blobs::upload(ctx, store, &mut blob, "garlic.png", Bytes::from_static(GARLIC_PNG))
        .await
        .unwrap();
    ctx.metadata.create_blob(&blob).await.unwrap();
    blob
}

fn webp_dimensions(bytes: &[u8]) -> (u32, u32) {
    let image = image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .unwrap()
        .decode()
        .unwrap();
    (image.width(), image.height())
}

#[tokio::test]
async fn test_process_produces_webp_within_box() {
    let ctx = context();
    let store = MemoryBackend::new();
    let blob = uploaded_image(&ctx, &store).await;

    let variant = representation(
        &ctx,
        blob,
        transformations(json!({"resize_to_limit": [10, 20]})),
    )
    .unwrap();
    assert_eq!(variant.variation.output_format(), "webp");

    let output = variant.process(&ctx, &store).await.unwrap();
    assert_eq!(&output[..4], b"RIFF");
    assert_eq!(&output[8..12], b"WEBP");
    let (w, h) = webp_dimensions(&output);
    assert!(w <= 10 && h <= 20, "got {w}x{h}");

    // The derived object is cached at the variant key.
    let key = variant.key(&ctx.signer).unwrap();
    assert!(key.starts_with(&format!("variants/{}/", variant.blob.key)));
    assert_eq!(store.get(&key).await.unwrap(), output);
}

#[tokio::test]
async fn test_process_is_idempotent() {
    let ctx = context();
    let store = MemoryBackend::new();
    let blob = uploaded_image(&ctx, &store).await;

    let variant = representation(
        &ctx,
        blob,
        transformations(json!({"resize_to_fit": [16, 16]})),
    )
    .unwrap();

    let first = variant.process(&ctx, &store).await.unwrap();
    let second = variant.process(&ctx, &store).await.unwrap();
    assert_eq!(first, second);

    // Only one variant record despite reprocessing.
    let digest = variant.variation.digest().unwrap();
    let record = ctx
        .metadata
        .get_variant_record(&variant.blob.id, &digest)
        .await
        .unwrap()
        .unwrap();
    assert!(record.image_blob_id.is_some());
}

#[tokio::test]
async fn test_record_tracking_probe() {
    let ctx = context();
    let store = MemoryBackend::new();
    let blob = uploaded_image(&ctx, &store).await;

    let variant = representation(
        &ctx,
        blob,
        transformations(json!({"rotate": 90})),
    )
    .unwrap();

    assert!(!variant.is_processed(&ctx, &store).await.unwrap());
    variant.ensure_processed(&ctx, &store).await.unwrap();
    assert!(variant.is_processed(&ctx, &store).await.unwrap());

    // The image blob row carries the derived content's description.
    let digest = variant.variation.digest().unwrap();
    let record = ctx
        .metadata
        .get_variant_record(&variant.blob.id, &digest)
        .await
        .unwrap()
        .unwrap();
    let image = ctx
        .metadata
        .get_blob(record.image_blob_id.as_deref().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(image.mime_type, "image/webp");
    assert_eq!(image.filename.as_deref(), Some("garlic.webp"));
    assert_eq!(image.key, variant.key(&ctx.signer).unwrap());
}

#[tokio::test]
async fn test_storage_probe_without_tracking() {
    let mut ctx = context();
    ctx.service.track_variants = false;
    let store = MemoryBackend::new();
    let blob = uploaded_image(&ctx, &store).await;

    let variant = representation(
        &ctx,
        blob,
        transformations(json!({"rotate": 180})),
    )
    .unwrap();

    assert!(!variant.is_processed(&ctx, &store).await.unwrap());
    variant.ensure_processed(&ctx, &store).await.unwrap();
    assert!(variant.is_processed(&ctx, &store).await.unwrap());

    // No rows were written.
    let digest = variant.variation.digest().unwrap();
    assert!(ctx
        .metadata
        .get_variant_record(&variant.blob.id, &digest)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_concurrent_first_process_with_record_tracking() {
    let dir = tempfile::tempdir().unwrap();
    let metadata = Arc::new(
        SqliteStore::new(dir.path().join("meta.db")).await.unwrap(),
    );
    let ctx = MediaContext::new(
        ServiceConfig::default(),
        TokenSigner::new(b"test-secret".to_vec()),
        metadata,
    );
    let store = MemoryBackend::new();
    let blob = uploaded_image(&ctx, &store).await;

    let variant = representation(
        &ctx,
        blob,
        transformations(json!({"resize_to_fit": [12, 12]})),
    )
    .unwrap();

    // Two unsynchronized racers both processing for the first time; both
    // must succeed and agree on one image blob row.
    let (first, second) =
        tokio::join!(variant.process(&ctx, &store), variant.process(&ctx, &store));
    assert_eq!(first.unwrap(), second.unwrap());

    let digest = variant.variation.digest().unwrap();
    let record = ctx
        .metadata
        .get_variant_record(&variant.blob.id, &digest)
        .await
        .unwrap()
        .unwrap();
    let image = ctx
        .metadata
        .get_blob(record.image_blob_id.as_deref().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(image.key, variant.key(&ctx.signer).unwrap());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let ctx = context();
    let store = MemoryBackend::new();
    let blob = uploaded_image(&ctx, &store).await;

    let variant = representation(
        &ctx,
        blob,
        transformations(json!({"resize_to_fit": [8, 8]})),
    )
    .unwrap();
    variant.process(&ctx, &store).await.unwrap();

    variant.delete(&ctx, &store).await.unwrap();
    variant.delete(&ctx, &store).await.unwrap();

    assert!(!variant.is_processed(&ctx, &store).await.unwrap());
    let key = variant.key(&ctx.signer).unwrap();
    assert!(!store.exists(&key).await.unwrap());
}

#[tokio::test]
async fn test_non_image_is_not_representable() {
    let ctx = context();
    let store = MemoryBackend::new();

    let mut blob = Blob::new(&ctx.service);
    blobs::upload(&ctx, &store, &mut blob, "notes.txt", Bytes::from_static(b"plain text"))
        .await
        .unwrap();

    let result = representation(&ctx, blob, transformations(json!({"rotate": 90})));
    assert!(matches!(
        result,
        Err(MediaError::NotRepresentable { ref mime_type }) if mime_type == "text/plain"
    ));
}

#[tokio::test]
async fn test_attach_with_dedup_shares_one_blob() {
    let ctx = context();
    let store = MemoryBackend::new();
    let options = AttachOptions {
        dedup: true,
        position: 0,
    };

    let (first_blob, _) = attach(
        &ctx,
        &store,
        "Recipe",
        "1",
        "photos",
        "garlic.png",
        Bytes::from_static(GARLIC_PNG),
        options.clone(),
    )
    .await
    .unwrap();
    let (second_blob, _) = attach(
        &ctx,
        &store,
        "Recipe",
        "2",
        "photos",
        "garlic.png",
        Bytes::from_static(GARLIC_PNG),
        options,
    )
    .await
    .unwrap();

    assert_eq!(first_blob.id, second_blob.id);
    assert_eq!(store.len(), 1);
    assert_eq!(
        ctx.metadata
            .attachments_for("Recipe", "1", "photos")
            .await
            .unwrap()
            .len(),
        1
    );
    assert_eq!(
        ctx.metadata
            .attachments_for("Recipe", "2", "photos")
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_attach_without_dedup_creates_fresh_blobs() {
    let ctx = context();
    let store = MemoryBackend::new();

    let (first_blob, _) = attach(
        &ctx,
        &store,
        "Recipe",
        "1",
        "photos",
        "garlic.png",
        Bytes::from_static(GARLIC_PNG),
        AttachOptions::default(),
    )
    .await
    .unwrap();
    let (second_blob, _) = attach(
        &ctx,
        &store,
        "Recipe",
        "1",
        "photos",
        "garlic.png",
        Bytes::from_static(GARLIC_PNG),
        AttachOptions {
            dedup: false,
            position: 1,
        },
    )
    .await
    .unwrap();

    assert_ne!(first_blob.id, second_blob.id);
    assert_ne!(first_blob.key, second_blob.key);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_purge_removes_derived_images() {
    let ctx = context();
    let store = MemoryBackend::new();
    let blob = uploaded_image(&ctx, &store).await;

    let variant = representation(
        &ctx,
        blob.clone(),
        transformations(json!({"resize_to_fit": [8, 8]})),
    )
    .unwrap();
    variant.process(&ctx, &store).await.unwrap();
    let variant_key = variant.key(&ctx.signer).unwrap();
    assert!(store.exists(&variant_key).await.unwrap());

    blobs::purge(&ctx, &store, &blob).await.unwrap();
    ctx.metadata.delete_blob(&blob.id).await.unwrap();

    assert!(!store.exists(&blob.key).await.unwrap());
    assert!(!store.exists(&variant_key).await.unwrap());
    let digest = variant.variation.digest().unwrap();
    assert!(ctx
        .metadata
        .get_variant_record(&blob.id, &digest)
        .await
        .unwrap()
        .is_none());
    // Purging again is harmless.
    blobs::purge(&ctx, &store, &blob).await.unwrap();
}
