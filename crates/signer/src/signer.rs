//! Tamper-evident value tokens with optional purpose tags and expiry.

use crate::error::{SignerError, SignerResult};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use time::{Duration, OffsetDateTime};

type HmacSha256 = Hmac<Sha256>;

/// Signed envelope carried inside a token.
///
/// Field names are single letters because the envelope travels inside URLs;
/// every byte of the payload is base64-encoded twice over the wire.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    /// Absolute expiry as unix seconds.
    #[serde(rename = "e", default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<i64>,
    /// Purpose tag scoping the token to one intent.
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    purpose: Option<String>,
    /// The signed payload.
    #[serde(rename = "v")]
    value: serde_json::Value,
}

/// Options for [`TokenSigner::sign`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SignOptions<'a> {
    /// Relative expiry; resolved against the signing instant.
    pub expires_in: Option<Duration>,
    /// Absolute expiry; takes effect when `expires_in` is not set.
    pub expires_at: Option<OffsetDateTime>,
    /// Purpose tag. Tokens signed with a purpose only unsign with the same one.
    pub purpose: Option<&'a str>,
}

impl<'a> SignOptions<'a> {
    /// Options with only a purpose tag set.
    pub fn with_purpose(purpose: &'a str) -> Self {
        Self {
            purpose: Some(purpose),
            ..Self::default()
        }
    }

    /// Options with only a relative expiry set.
    pub fn expiring_in(expires_in: Duration) -> Self {
        Self {
            expires_in: Some(expires_in),
            ..Self::default()
        }
    }

    /// Set the purpose tag.
    pub fn purpose(mut self, purpose: &'a str) -> Self {
        self.purpose = Some(purpose);
        self
    }

    /// Set the relative expiry.
    pub fn expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }
}

/// Signs and verifies values as `payload.mac` tokens.
///
/// The payload is the URL-safe base64 of a compact JSON envelope and the MAC
/// is HMAC-SHA256 over that payload. Tokens are URL-safe as a whole and never
/// expose the raw value unauthenticated.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    /// Create a signer from raw secret bytes.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Create a signer with a fresh random secret.
    ///
    /// Tokens from a generated secret do not survive a process restart.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut secret = vec![0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut secret);
        Self { secret }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length")
    }

    /// Sign a value into a tamper-evident token.
    pub fn sign<T: Serialize>(&self, value: &T, options: SignOptions<'_>) -> SignerResult<String> {
        let expires_at = match options.expires_in {
            Some(expires_in) => Some(OffsetDateTime::now_utc() + expires_in),
            None => options.expires_at,
        };

        let envelope = Envelope {
            expires_at: expires_at.map(|t| t.unix_timestamp()),
            purpose: options.purpose.map(str::to_string),
            value: serde_json::to_value(value)?,
        };

        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&envelope)?);
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let tag = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{tag}"))
    }

    /// Verify a token and recover the signed value.
    ///
    /// The MAC is checked before the envelope is parsed, so malformed or
    /// forged tokens uniformly fail with [`SignerError::InvalidSignature`].
    /// Purpose matching is symmetric: a token carrying a purpose tag does not
    /// unsign without one, and vice versa.
    pub fn unsign<T: DeserializeOwned>(
        &self,
        token: &str,
        purpose: Option<&str>,
    ) -> SignerResult<T> {
        let (payload, tag) = token
            .rsplit_once('.')
            .ok_or(SignerError::InvalidSignature)?;
        let tag = URL_SAFE_NO_PAD
            .decode(tag)
            .map_err(|_| SignerError::InvalidSignature)?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&tag)
            .map_err(|_| SignerError::InvalidSignature)?;

        let raw = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| SignerError::InvalidSignature)?;
        let envelope: Envelope =
            serde_json::from_slice(&raw).map_err(|_| SignerError::InvalidSignature)?;

        match (purpose, envelope.purpose.as_deref()) {
            (None, None) => {}
            (Some(expected), Some(found)) if expected == found => {}
            _ => return Err(SignerError::InvalidPurpose),
        }

        if let Some(expires_at) = envelope.expires_at {
            if expires_at < OffsetDateTime::now_utc().unix_timestamp() {
                return Err(SignerError::ExpiredSignature);
            }
        }

        Ok(serde_json::from_value(envelope.value)?)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"<redacted>")
            .finish()
    }
}
