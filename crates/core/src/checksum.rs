//! Content checksums for integrity checks and upload deduplication.
//!
//! MD5, URL-safe base64. Not collision-resistant; never used as a security
//! boundary, only to detect corruption and to spot byte-identical uploads.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use md5::{Digest, Md5};

/// Size of the hashing window.
const CHUNK: usize = 1024;

/// Checksum an in-memory buffer.
pub fn checksum_bytes(bytes: &[u8]) -> String {
    let mut hasher = Md5::new();
    for chunk in bytes.chunks(CHUNK) {
        hasher.update(chunk);
    }
    URL_SAFE.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_value() {
        assert_eq!(checksum_bytes(b"hello world"), "XrY7u-Ae7tCTyyK7j1rNww==");
    }

    #[test]
    fn test_deterministic() {
        let data = vec![7u8; 5000];
        assert_eq!(checksum_bytes(&data), checksum_bytes(&data));
    }

    #[test]
    fn test_sensitive_to_single_byte() {
        assert_ne!(checksum_bytes(b"hello world"), checksum_bytes(b"hello worle"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(checksum_bytes(b""), "1B2M2Y8AsgTpgAmY7PhCfg==");
    }
}
