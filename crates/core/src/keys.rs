//! Identifier and storage-key generation.
//!
//! Two alphabets for two audiences: primary ids are base58 (fixed-width,
//! double-click selectable, no lookalike characters) and storage keys are
//! lowercase base32 (safe on case-insensitive filesystems).

use data_encoding::BASE32_NOPAD;
use rand::RngCore;
use time::OffsetDateTime;
use time::format_description;
use uuid::Uuid;

use crate::error::Result;

/// Width every primary id is padded to. 16 bytes of entropy encode to at most
/// 22 base58 characters.
const PK_LEN: usize = 22;

/// Default entropy for storage keys, in bytes.
const KEY_LEN: usize = 30;

/// Generate a fixed-width primary id: base58 of a random UUIDv4, left-padded
/// with `'1'` (the alphabet's zero digit) to 22 characters.
pub fn generate_pk() -> String {
    let encoded = bs58::encode(Uuid::new_v4().as_bytes()).into_string();
    let mut pk = String::with_capacity(PK_LEN);
    for _ in encoded.len()..PK_LEN {
        pk.push('1');
    }
    pk.push_str(&encoded);
    pk
}

/// Generate a storage key: lowercase unpadded base32 of 30 random bytes.
pub fn generate_key() -> String {
    generate_key_with_len(KEY_LEN)
}

/// Generate a storage key from `len` random bytes.
pub fn generate_key_with_len(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    BASE32_NOPAD.encode(&bytes).to_ascii_lowercase()
}

/// Generate a storage key under a timestamp-derived directory prefix.
///
/// The template is a time-crate format description evaluated against UTC now,
/// e.g. `"[year]/[month]/[day]"` yields keys like `2026/08/29/<key>`.
pub fn key_with_prefix(template: &str) -> Result<String> {
    let format = format_description::parse(template)?;
    let prefix = OffsetDateTime::now_utc().format(&format)?;
    Ok(format!("{prefix}/{}", generate_key()))
}

/// Reduce an externally-supplied filename to a single safe path component.
///
/// Directory components, path separators, control characters, and leading
/// dots are stripped. An empty result becomes `"file"`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .collect();
    let cleaned = cleaned.trim_start_matches('.').trim();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}
