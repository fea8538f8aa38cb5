//! Secret material resolution for the token signer.

use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{SignerError, SignerResult};
use crate::signer::TokenSigner;

/// Where the signing secret comes from.
///
/// Configured as a tagged table, e.g. `secret = { source = "file", path =
/// "/var/lib/holdfast/secret" }`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SecretConfig {
    /// Read the secret from a file (base64 or raw bytes).
    File { path: PathBuf },
    /// Read the secret from an environment variable.
    Env { var: String },
    /// Inline secret value, base64-encoded. Intended for tests and dev setups.
    Value { value: String },
    /// Generate a random secret at startup.
    ///
    /// Every token is invalidated on restart; useful only for throwaway
    /// deployments and tests.
    Generate,
}

impl SecretConfig {
    /// Resolve the configured source into a ready signer.
    pub fn resolve(&self) -> SignerResult<TokenSigner> {
        match self {
            SecretConfig::File { path } => {
                let contents = std::fs::read(path)?;
                Ok(TokenSigner::new(decode_secret(&contents)))
            }
            SecretConfig::Env { var } => {
                let value = std::env::var(var).map_err(|_| {
                    SignerError::SecretResolution(format!(
                        "environment variable {var} is not set"
                    ))
                })?;
                Ok(TokenSigner::new(decode_secret(value.as_bytes())))
            }
            SecretConfig::Value { value } => Ok(TokenSigner::new(decode_secret(value.as_bytes()))),
            SecretConfig::Generate => {
                warn!("using a generated signing secret; tokens will not survive a restart");
                Ok(TokenSigner::generate())
            }
        }
    }

    /// Produce a fresh base64 secret suitable for a `value` or `file` source.
    pub fn generate_value() -> String {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut secret);
        STANDARD.encode(secret)
    }
}

/// Secrets are stored base64-encoded where possible; fall back to treating the
/// bytes as the raw secret so hand-written files still work.
fn decode_secret(raw: &[u8]) -> Vec<u8> {
    let trimmed: Vec<u8> = raw
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    match STANDARD.decode(&trimmed) {
        Ok(decoded) if !decoded.is_empty() => decoded,
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::SignOptions;
    use std::io::Write;

    #[test]
    fn test_resolve_value_source() {
        let config = SecretConfig::Value {
            value: STANDARD.encode(b"super-secret"),
        };
        let signer = config.resolve().unwrap();
        let token = signer.sign(&"x", SignOptions::default()).unwrap();
        let back: String = signer.unsign(&token, None).unwrap();
        assert_eq!(back, "x");

        // Same secret bytes resolve to an interchangeable signer.
        let again = config.resolve().unwrap();
        let back: String = again.unsign(&token, None).unwrap();
        assert_eq!(back, "x");
    }

    #[test]
    fn test_resolve_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}\n", STANDARD.encode(b"file-secret")).unwrap();

        let config = SecretConfig::File {
            path: file.path().to_path_buf(),
        };
        let signer = config.resolve().unwrap();
        let token = signer.sign(&"y", SignOptions::default()).unwrap();
        let back: String = config.resolve().unwrap().unsign(&token, None).unwrap();
        assert_eq!(back, "y");
    }

    #[test]
    fn test_resolve_missing_file_fails() {
        let config = SecretConfig::File {
            path: PathBuf::from("/nonexistent/holdfast-secret"),
        };
        assert!(config.resolve().is_err());
    }

    #[test]
    fn test_raw_secret_file_accepted() {
        // Not base64: the bytes themselves become the secret.
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "!!not base64!!").unwrap();

        let config = SecretConfig::File {
            path: file.path().to_path_buf(),
        };
        assert!(config.resolve().is_ok());
    }

    #[test]
    fn test_generate_value_roundtrips() {
        let value = SecretConfig::generate_value();
        assert_eq!(STANDARD.decode(&value).unwrap().len(), 32);
    }

    #[test]
    fn test_config_deserializes_from_toml_shape() {
        let config: SecretConfig =
            serde_json::from_value(serde_json::json!({"source": "env", "var": "HOLDFAST_SECRET"}))
                .unwrap();
        assert!(matches!(config, SecretConfig::Env { .. }));

        let config: SecretConfig =
            serde_json::from_value(serde_json::json!({"source": "generate"})).unwrap();
        assert!(matches!(config, SecretConfig::Generate));
    }
}
