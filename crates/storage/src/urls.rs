//! URL generation for stored objects.
//!
//! Every backend gets exactly one URL strategy, fixed when the configuration
//! is loaded: the backend's own native URL, an application-served signed URL,
//! or an object-store presigned URL.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use time::Duration;

use holdfast_signer::{SignOptions, TokenSigner};

use crate::error::StorageResult;
use crate::traits::{ObjectStore, PresignOptions};

/// Purpose tag on signed filesystem-serving tokens.
pub const FILE_SYSTEM_PURPOSE: &str = "file_system";

/// Characters escaped in the trailing filename path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'%')
    .add(b'/')
    .add(b'\\');

/// Signed envelope behind a `/disk/...` URL.
///
/// Carries everything the serving route needs, so the route does not touch
/// the metadata store at all.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FileToken {
    pub key: String,
    pub backend: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disposition: Option<String>,
}

/// How the served file asks the browser to handle it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DispositionKind {
    #[default]
    Inline,
    Attachment,
}

impl DispositionKind {
    fn as_str(&self) -> &'static str {
        match self {
            DispositionKind::Inline => "inline",
            DispositionKind::Attachment => "attachment",
        }
    }
}

/// Build a `Content-Disposition` value, quoting the filename.
pub fn content_disposition(kind: DispositionKind, filename: Option<&str>) -> String {
    match filename {
        Some(name) => {
            let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
            format!("{}; filename=\"{escaped}\"", kind.as_str())
        }
        None => kind.as_str().to_string(),
    }
}

/// Per-call URL parameters.
#[derive(Clone, Debug, Default)]
pub struct UrlOptions {
    /// Trailing display filename for application-served URLs.
    pub filename: Option<String>,
    /// Content type the response should declare, overriding what the backend
    /// would serve.
    pub mime_type: Option<String>,
    pub disposition: DispositionKind,
    /// Override the generator's default lifetime.
    pub expires_in: Option<Duration>,
}

/// URL strategy for one backend.
#[derive(Clone, Debug)]
pub enum UrlGenerator {
    /// Delegate to the backend's unsigned URL; extras are ignored.
    Native,
    /// Sign a [`FileToken`] and serve through this application's `/disk/`
    /// route.
    FileSystem {
        /// Backend name recorded in the token.
        backend: String,
        /// Default token lifetime.
        expiry: Duration,
    },
    /// Presigned URL minted by the object store.
    ObjectStorage {
        expiry: Duration,
    },
}

impl UrlGenerator {
    /// Generate a URL for `key` in `store`.
    pub async fn url(
        &self,
        store: &dyn ObjectStore,
        signer: &TokenSigner,
        key: &str,
        options: UrlOptions,
    ) -> StorageResult<String> {
        match self {
            UrlGenerator::Native => store.native_url(key),
            UrlGenerator::FileSystem { backend, expiry } => {
                let token = FileToken {
                    key: key.to_string(),
                    backend: backend.clone(),
                    mime_type: options.mime_type,
                    disposition: Some(content_disposition(
                        options.disposition,
                        options.filename.as_deref(),
                    )),
                };
                let signed = signer.sign(
                    &token,
                    SignOptions::with_purpose(FILE_SYSTEM_PURPOSE)
                        .expires_in(options.expires_in.unwrap_or(*expiry)),
                )?;
                match options.filename {
                    Some(name) => Ok(format!(
                        "/disk/{signed}/{}",
                        utf8_percent_encode(&name, PATH_SEGMENT)
                    )),
                    None => Ok(format!("/disk/{signed}")),
                }
            }
            UrlGenerator::ObjectStorage { expiry } => {
                store
                    .presigned_url(
                        key,
                        PresignOptions {
                            expires_in: options.expires_in.unwrap_or(*expiry),
                            response_content_type: options.mime_type,
                            response_content_disposition: Some(content_disposition(
                                options.disposition,
                                options.filename.as_deref(),
                            )),
                        },
                    )
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryBackend;

    fn signer() -> TokenSigner {
        TokenSigner::new(b"secret".to_vec())
    }

    #[test]
    fn test_content_disposition() {
        assert_eq!(content_disposition(DispositionKind::Inline, None), "inline");
        assert_eq!(
            content_disposition(DispositionKind::Attachment, Some("report.pdf")),
            "attachment; filename=\"report.pdf\""
        );
        assert_eq!(
            content_disposition(DispositionKind::Inline, Some("a\"b.txt")),
            "inline; filename=\"a\\\"b.txt\""
        );
    }

    #[tokio::test]
    async fn test_file_system_url_token_roundtrip() {
        let signer = signer();
        let store = MemoryBackend::new();
        let generator = UrlGenerator::FileSystem {
            backend: "default".to_string(),
            expiry: Duration::hours(1),
        };

        let url = generator
            .url(
                &store,
                &signer,
                "blobs/abc",
                UrlOptions {
                    filename: Some("garlic press.png".to_string()),
                    mime_type: Some("image/png".to_string()),
                    ..UrlOptions::default()
                },
            )
            .await
            .unwrap();

        let rest = url.strip_prefix("/disk/").unwrap();
        let (token, filename) = rest.split_once('/').unwrap();
        assert_eq!(filename, "garlic%20press.png");

        let decoded: FileToken = signer.unsign(token, Some(FILE_SYSTEM_PURPOSE)).unwrap();
        assert_eq!(decoded.key, "blobs/abc");
        assert_eq!(decoded.backend, "default");
        assert_eq!(decoded.mime_type.as_deref(), Some("image/png"));
        assert_eq!(
            decoded.disposition.as_deref(),
            Some("inline; filename=\"garlic press.png\"")
        );
    }

    #[tokio::test]
    async fn test_file_system_url_without_filename() {
        let signer = signer();
        let store = MemoryBackend::new();
        let generator = UrlGenerator::FileSystem {
            backend: "default".to_string(),
            expiry: Duration::hours(1),
        };

        let url = generator
            .url(&store, &signer, "k", UrlOptions::default())
            .await
            .unwrap();
        let token = url.strip_prefix("/disk/").unwrap();
        assert!(!token.contains('/'));
        let decoded: FileToken = signer.unsign(token, Some(FILE_SYSTEM_PURPOSE)).unwrap();
        assert_eq!(decoded.key, "k");
    }

    #[tokio::test]
    async fn test_native_url_unsupported_for_memory() {
        let signer = signer();
        let store = MemoryBackend::new();
        let result = UrlGenerator::Native
            .url(&store, &signer, "k", UrlOptions::default())
            .await;
        assert!(result.is_err());
    }
}
