//! Metadata store trait and the SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::models::{Attachment, VariantRecord};
use crate::repos::{AttachmentRepo, BlobRepo, VariantRecordRepo};
use async_trait::async_trait;
use holdfast_core::Blob;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use time::OffsetDateTime;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: BlobRepo + AttachmentRepo + VariantRecordRepo + Send + Sync {
    /// Create the schema if it does not exist.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check store connectivity.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-backed metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (creating if missing) and migrate a SQLite store.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection
            // avoids "database is locked" failures under server concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

fn blob_from_row(row: &SqliteRow) -> MetadataResult<Blob> {
    let metadata_json: String = row.try_get("metadata")?;
    let byte_size: Option<i64> = row.try_get("byte_size")?;
    Ok(Blob {
        id: row.try_get("id")?,
        key: row.try_get("key")?,
        filename: row.try_get("filename")?,
        mime_type: row.try_get("mime_type")?,
        backend: row.try_get("backend")?,
        byte_size: byte_size.map(|n| n as u64),
        checksum: row.try_get("checksum")?,
        metadata: serde_json::from_str(&metadata_json)?,
        created_at: row.try_get("created_at")?,
    })
}

fn attachment_from_row(row: &SqliteRow) -> MetadataResult<Attachment> {
    Ok(Attachment {
        id: row.try_get("id")?,
        blob_id: row.try_get("blob_id")?,
        record_type: row.try_get("record_type")?,
        record_id: row.try_get("record_id")?,
        name: row.try_get("name")?,
        position: row.try_get("position")?,
        created_at: row.try_get("created_at")?,
    })
}

fn variant_record_from_row(row: &SqliteRow) -> MetadataResult<VariantRecord> {
    Ok(VariantRecord {
        id: row.try_get("id")?,
        blob_id: row.try_get("blob_id")?,
        variation_digest: row.try_get("variation_digest")?,
        image_blob_id: row.try_get("image_blob_id")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS blobs (
                id TEXT PRIMARY KEY,
                key TEXT NOT NULL UNIQUE,
                filename TEXT,
                mime_type TEXT NOT NULL,
                backend TEXT NOT NULL,
                byte_size INTEGER,
                checksum TEXT,
                metadata TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_blobs_content
             ON blobs (checksum, byte_size, backend)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS attachments (
                id TEXT PRIMARY KEY,
                blob_id TEXT NOT NULL REFERENCES blobs(id),
                record_type TEXT NOT NULL,
                record_id TEXT NOT NULL,
                name TEXT NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_attachments_record
             ON attachments (record_type, record_id, name, position)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_attachments_blob ON attachments (blob_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS variant_records (
                id TEXT PRIMARY KEY,
                blob_id TEXT NOT NULL REFERENCES blobs(id),
                variation_digest TEXT NOT NULL,
                image_blob_id TEXT REFERENCES blobs(id),
                created_at TEXT NOT NULL,
                UNIQUE (blob_id, variation_digest)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_variant_records_image
             ON variant_records (image_blob_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl BlobRepo for SqliteStore {
    async fn create_blob(&self, blob: &Blob) -> MetadataResult<()> {
        sqlx::query(
            r#"
            INSERT INTO blobs (id, key, filename, mime_type, backend, byte_size, checksum, metadata, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&blob.id)
        .bind(&blob.key)
        .bind(&blob.filename)
        .bind(&blob.mime_type)
        .bind(&blob.backend)
        .bind(blob.byte_size.map(|n| n as i64))
        .bind(&blob.checksum)
        .bind(serde_json::to_string(&blob.metadata)?)
        .bind(blob.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_blob_if_absent(&self, blob: &Blob) -> MetadataResult<Blob> {
        sqlx::query(
            r#"
            INSERT INTO blobs (id, key, filename, mime_type, backend, byte_size, checksum, metadata, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(&blob.id)
        .bind(&blob.key)
        .bind(&blob.filename)
        .bind(&blob.mime_type)
        .bind(&blob.backend)
        .bind(blob.byte_size.map(|n| n as i64))
        .bind(&blob.checksum)
        .bind(serde_json::to_string(&blob.metadata)?)
        .bind(blob.created_at)
        .execute(&self.pool)
        .await?;

        self.get_blob_by_key(&blob.key)
            .await?
            .ok_or_else(|| MetadataError::NotFound(format!("blob at key {}", blob.key)))
    }

    async fn get_blob(&self, id: &str) -> MetadataResult<Option<Blob>> {
        let row = sqlx::query("SELECT * FROM blobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(blob_from_row).transpose()
    }

    async fn get_blob_by_key(&self, key: &str) -> MetadataResult<Option<Blob>> {
        let row = sqlx::query("SELECT * FROM blobs WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(blob_from_row).transpose()
    }

    async fn update_blob(&self, blob: &Blob) -> MetadataResult<()> {
        sqlx::query(
            r#"
            UPDATE blobs
            SET key = ?, filename = ?, mime_type = ?, backend = ?,
                byte_size = ?, checksum = ?, metadata = ?
            WHERE id = ?
            "#,
        )
        .bind(&blob.key)
        .bind(&blob.filename)
        .bind(&blob.mime_type)
        .bind(&blob.backend)
        .bind(blob.byte_size.map(|n| n as i64))
        .bind(&blob.checksum)
        .bind(serde_json::to_string(&blob.metadata)?)
        .bind(&blob.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_blob(&self, id: &str) -> MetadataResult<()> {
        sqlx::query("DELETE FROM blobs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_blob_by_checksum(
        &self,
        checksum: &str,
        byte_size: u64,
        backend: &str,
    ) -> MetadataResult<Option<Blob>> {
        let row = sqlx::query(
            "SELECT * FROM blobs WHERE checksum = ? AND byte_size = ? AND backend = ? LIMIT 1",
        )
        .bind(checksum)
        .bind(byte_size as i64)
        .bind(backend)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(blob_from_row).transpose()
    }

    async fn unattached_blobs(
        &self,
        created_before: Option<OffsetDateTime>,
    ) -> MetadataResult<Vec<Blob>> {
        // Blobs referenced as a variant record's image are derived data, not
        // orphans; their lifecycle follows the source blob.
        let rows = match created_before {
            Some(cutoff) => {
                sqlx::query(
                    r#"
                    SELECT * FROM blobs b
                    WHERE NOT EXISTS (SELECT 1 FROM attachments a WHERE a.blob_id = b.id)
                      AND NOT EXISTS (SELECT 1 FROM variant_records v WHERE v.image_blob_id = b.id)
                      AND b.created_at < ?
                    ORDER BY b.created_at
                    "#,
                )
                .bind(cutoff)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT * FROM blobs b
                    WHERE NOT EXISTS (SELECT 1 FROM attachments a WHERE a.blob_id = b.id)
                      AND NOT EXISTS (SELECT 1 FROM variant_records v WHERE v.image_blob_id = b.id)
                    ORDER BY b.created_at
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.iter().map(blob_from_row).collect()
    }
}

#[async_trait]
impl AttachmentRepo for SqliteStore {
    async fn create_attachment(&self, attachment: &Attachment) -> MetadataResult<()> {
        sqlx::query(
            r#"
            INSERT INTO attachments (id, blob_id, record_type, record_id, name, position, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&attachment.id)
        .bind(&attachment.blob_id)
        .bind(&attachment.record_type)
        .bind(&attachment.record_id)
        .bind(&attachment.name)
        .bind(attachment.position)
        .bind(attachment.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn attachments_for(
        &self,
        record_type: &str,
        record_id: &str,
        name: &str,
    ) -> MetadataResult<Vec<Attachment>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM attachments
            WHERE record_type = ? AND record_id = ? AND name = ?
            ORDER BY position, created_at
            "#,
        )
        .bind(record_type)
        .bind(record_id)
        .bind(name)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(attachment_from_row).collect()
    }

    async fn delete_attachment(&self, id: &str) -> MetadataResult<()> {
        sqlx::query("DELETE FROM attachments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl VariantRecordRepo for SqliteStore {
    async fn get_variant_record(
        &self,
        blob_id: &str,
        variation_digest: &str,
    ) -> MetadataResult<Option<VariantRecord>> {
        let row = sqlx::query(
            "SELECT * FROM variant_records WHERE blob_id = ? AND variation_digest = ?",
        )
        .bind(blob_id)
        .bind(variation_digest)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(variant_record_from_row).transpose()
    }

    async fn get_or_create_variant_record(
        &self,
        blob_id: &str,
        variation_digest: &str,
    ) -> MetadataResult<VariantRecord> {
        let fresh = VariantRecord::new(blob_id, variation_digest);
        sqlx::query(
            r#"
            INSERT INTO variant_records (id, blob_id, variation_digest, image_blob_id, created_at)
            VALUES (?, ?, ?, NULL, ?)
            ON CONFLICT (blob_id, variation_digest) DO NOTHING
            "#,
        )
        .bind(&fresh.id)
        .bind(&fresh.blob_id)
        .bind(&fresh.variation_digest)
        .bind(fresh.created_at)
        .execute(&self.pool)
        .await?;

        self.get_variant_record(blob_id, variation_digest)
            .await?
            .ok_or_else(|| {
                MetadataError::NotFound(format!("variant record {blob_id}/{variation_digest}"))
            })
    }

    async fn set_variant_record_image(
        &self,
        id: &str,
        image_blob_id: &str,
    ) -> MetadataResult<()> {
        sqlx::query("UPDATE variant_records SET image_blob_id = ? WHERE id = ?")
            .bind(image_blob_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_variant_record(&self, id: &str) -> MetadataResult<()> {
        sqlx::query("DELETE FROM variant_records WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_variant_records_for_blob(
        &self,
        blob_id: &str,
    ) -> MetadataResult<Vec<VariantRecord>> {
        let rows = sqlx::query("SELECT * FROM variant_records WHERE blob_id = ?")
            .bind(blob_id)
            .fetch_all(&self.pool)
            .await?;
        let records: Vec<VariantRecord> =
            rows.iter().map(variant_record_from_row).collect::<MetadataResult<_>>()?;
        sqlx::query("DELETE FROM variant_records WHERE blob_id = ?")
            .bind(blob_id)
            .execute(&self.pool)
            .await?;
        Ok(records)
    }
}
