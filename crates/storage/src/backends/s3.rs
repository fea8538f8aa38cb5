//! S3-compatible storage backend using the AWS SDK.

use crate::error::{StorageError, StorageResult};
use crate::traits::{ByteStream, ObjectStore, PresignOptions};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::presigning::PresigningConfig;
use bytes::Bytes;
use tokio_util::io::ReaderStream;
use tracing::instrument;

fn map_sdk_error<E>(err: aws_sdk_s3::error::SdkError<E>, key: &str) -> StorageError
where
    E: std::error::Error + Send + Sync + 'static,
{
    if let aws_sdk_s3::error::SdkError::ServiceError(ref service_err) = err {
        if service_err.raw().status().as_u16() == 404 {
            return StorageError::NotFound(key.to_string());
        }
    }
    StorageError::S3(Box::new(err))
}

/// S3-compatible object store.
pub struct S3Backend {
    client: Client,
    bucket: String,
    prefix: Option<String>,
    /// Normalized endpoint, kept for native URL construction.
    endpoint: String,
    region: String,
}

impl std::fmt::Debug for S3Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Backend")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl S3Backend {
    /// Create a new S3 backend.
    ///
    /// `force_path_style` selects `endpoint/bucket/key` URLs instead of
    /// virtual-hosted style; required for MinIO and similar services.
    pub async fn new(
        bucket: &str,
        region: Option<String>,
        endpoint: Option<String>,
        prefix: Option<String>,
        force_path_style: bool,
    ) -> StorageResult<Self> {
        let resolved_region = region.unwrap_or_else(|| "us-east-1".to_string());

        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(resolved_region.clone()))
            .load()
            .await;
        let mut builder = aws_sdk_s3::config::Builder::from(&base);

        // Bare host:port endpoints (e.g. "minio:9000") get an http scheme.
        let normalized_endpoint = endpoint.map(|url| {
            let lower = url.to_lowercase();
            if lower.starts_with("http://") || lower.starts_with("https://") {
                url
            } else {
                format!("http://{url}")
            }
        });
        if let Some(endpoint_url) = &normalized_endpoint {
            builder = builder.endpoint_url(endpoint_url);
        }
        if force_path_style {
            builder = builder.force_path_style(true);
        }

        let client = Client::from_conf(builder.build());

        let stored_endpoint = match &normalized_endpoint {
            Some(url) => url.clone(),
            None => format!("https://s3.{resolved_region}.amazonaws.com"),
        };
        // Strip trailing slashes so prefixed keys never contain "//".
        let normalized_prefix = prefix.map(|p| p.trim_end_matches('/').to_string());

        Ok(Self {
            client,
            bucket: bucket.to_string(),
            prefix: normalized_prefix,
            endpoint: stored_endpoint,
            region: resolved_region,
        })
    }

    fn full_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}/{key}"),
            None => key.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Backend {
    #[instrument(skip(self), fields(backend = "s3"))]
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let full_key = self.full_key(key);
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                if let aws_sdk_s3::error::SdkError::ServiceError(ref service_err) = err {
                    if service_err.raw().status().as_u16() == 404 {
                        return Ok(false);
                    }
                }
                Err(StorageError::S3(Box::new(err)))
            }
        }
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let full_key = self.full_key(key);
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::S3(Box::new(e)))?
            .into_bytes();

        Ok(bytes)
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream> {
        use futures::StreamExt;

        let full_key = self.full_key(key);
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;

        let reader = output.body.into_async_read();
        let stream = ReaderStream::new(reader).map(|result| result.map_err(StorageError::Io));

        Ok(Box::pin(stream))
    }

    #[instrument(skip(self, data), fields(backend = "s3", size = data.len()))]
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        let full_key = self.full_key(key);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .body(data.into())
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn delete(&self, key: &str) -> StorageResult<()> {
        let full_key = self.full_key(key);
        // DeleteObject succeeds on missing keys, matching the idempotence
        // contract for free.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;
        Ok(())
    }

    fn native_url(&self, key: &str) -> StorageResult<String> {
        if !self.valid_key(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(format!(
            "{}/{}/{}",
            self.endpoint,
            self.bucket,
            self.full_key(key)
        ))
    }

    #[instrument(skip(self, options), fields(backend = "s3"))]
    async fn presigned_url(&self, key: &str, options: PresignOptions) -> StorageResult<String> {
        let full_key = self.full_key(key);
        let expires_in = std::time::Duration::from_secs(
            options.expires_in.whole_seconds().max(1) as u64,
        );
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::Config(format!("invalid presign expiry: {e}")))?;

        let mut request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&full_key);
        if let Some(content_type) = options.response_content_type {
            request = request.response_content_type(content_type);
        }
        if let Some(disposition) = options.response_content_disposition {
            request = request.response_content_disposition(disposition);
        }

        let presigned = request
            .presigned(presigning)
            .await
            .map_err(|e| map_sdk_error(e, key))?;

        Ok(presigned.uri().to_string())
    }

    fn backend_kind(&self) -> &'static str {
        "s3"
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn health_check(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::S3(Box::new(e)))?;
        Ok(())
    }
}
