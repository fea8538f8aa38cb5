//! Signed, expiring, purpose-scoped value tokens.
//!
//! Everything that leaves the application as a capability — blob ids inside
//! URLs, storage keys, transformation recipes — travels through
//! [`TokenSigner`]: a compact JSON envelope, URL-safe base64, authenticated
//! with HMAC-SHA256. Tokens optionally carry an expiry and a purpose tag so a
//! token minted for one route cannot be replayed against another.

mod error;
mod secret;
mod signer;

pub use error::{SignerError, SignerResult};
pub use secret::SecretConfig;
pub use signer::{SignOptions, TokenSigner};
