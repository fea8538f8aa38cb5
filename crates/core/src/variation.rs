//! Variations: ordered transformation recipes for derived images.
//!
//! A variation is an order-preserving map of transformation name to argument.
//! Its digest and signed key both derive from the exact serialized map, so the
//! same recipe always addresses the same derived object and a reordered
//! recipe addresses a different one.

use serde_json::{Map, Value};
use sha1::{Digest, Sha1};

use holdfast_signer::{SignOptions, TokenSigner};

use crate::error::Result;
use crate::mime;

/// Purpose tag on signed variation keys.
pub const VARIATION_PURPOSE: &str = "variation";

/// Reserved transformation-map entry naming the output format.
pub const FORMAT_KEY: &str = "format";

const DEFAULT_FORMAT: &str = "png";

/// An ordered transformation recipe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variation {
    transformations: Map<String, Value>,
}

/// Anything a caller may hand over where a variation is expected.
pub enum VariationInput {
    Variation(Variation),
    /// A signed variation key, as minted by [`Variation::key`].
    Key(String),
    /// A raw transformation map.
    Transformations(Map<String, Value>),
}

impl From<Variation> for VariationInput {
    fn from(v: Variation) -> Self {
        VariationInput::Variation(v)
    }
}

impl From<String> for VariationInput {
    fn from(key: String) -> Self {
        VariationInput::Key(key)
    }
}

impl From<&str> for VariationInput {
    fn from(key: &str) -> Self {
        VariationInput::Key(key.to_string())
    }
}

impl From<Map<String, Value>> for VariationInput {
    fn from(map: Map<String, Value>) -> Self {
        VariationInput::Transformations(map)
    }
}

impl Variation {
    pub fn new(transformations: Map<String, Value>) -> Self {
        Self { transformations }
    }

    /// Normalize caller input into a variation, unsigning keys as needed.
    pub fn wrap(input: impl Into<VariationInput>, signer: &TokenSigner) -> Result<Self> {
        match input.into() {
            VariationInput::Variation(v) => Ok(v),
            VariationInput::Key(key) => Self::decode(&key, signer),
            VariationInput::Transformations(map) => Ok(Self::new(map)),
        }
    }

    /// Decode a signed variation key.
    pub fn decode(key: &str, signer: &TokenSigner) -> Result<Self> {
        let transformations: Map<String, Value> =
            signer.unsign(key, Some(VARIATION_PURPOSE))?;
        Ok(Self::new(transformations))
    }

    /// Signed encoding of the full transformation map.
    pub fn key(&self, signer: &TokenSigner) -> Result<String> {
        Ok(signer.sign(
            &self.transformations,
            SignOptions::with_purpose(VARIATION_PURPOSE),
        )?)
    }

    /// Stable content digest: base58 of SHA-1 over the serialized map.
    ///
    /// Order-sensitive by construction; the map serializes in insertion
    /// order.
    pub fn digest(&self) -> Result<String> {
        let canonical = serde_json::to_vec(&self.transformations)?;
        let mut hasher = Sha1::new();
        hasher.update(&canonical);
        Ok(bs58::encode(hasher.finalize()).into_string())
    }

    /// Left-biased merge: entries already present win, defaults fill gaps.
    pub fn default_to(mut self, defaults: &Map<String, Value>) -> Self {
        for (name, value) in defaults {
            if !self.transformations.contains_key(name) {
                self.transformations.insert(name.clone(), value.clone());
            }
        }
        self
    }

    /// The requested output format, or `"png"`.
    pub fn output_format(&self) -> &str {
        self.transformations
            .get(FORMAT_KEY)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_FORMAT)
    }

    /// MIME type of the derived output, guessed from the format.
    pub fn mime_type(&self, default: &str) -> String {
        mime::guess(&format!("file.{}", self.output_format()), default)
    }

    /// The transformation steps to apply, in order, skipping the reserved
    /// format entry. The map itself is never mutated; the digest and key
    /// always cover the format.
    pub fn steps(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.transformations
            .iter()
            .filter(|(name, _)| name.as_str() != FORMAT_KEY)
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn transformations(&self) -> &Map<String, Value> {
        &self.transformations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn signer() -> TokenSigner {
        TokenSigner::new(b"secret".to_vec())
    }

    #[test]
    fn test_digest_is_stable_and_order_sensitive() {
        let a = Variation::new(map(json!({"resize_to_fit": [10, 20], "rotate": 90})));
        let b = Variation::new(map(json!({"resize_to_fit": [10, 20], "rotate": 90})));
        let c = Variation::new(map(json!({"rotate": 90, "resize_to_fit": [10, 20]})));

        assert_eq!(a.digest().unwrap(), b.digest().unwrap());
        assert_ne!(a.digest().unwrap(), c.digest().unwrap());
    }

    #[test]
    fn test_key_roundtrip() {
        let signer = signer();
        let variation = Variation::new(map(json!({"resize_to_fit": [10, 20], "format": "webp"})));
        let key = variation.key(&signer).unwrap();
        let decoded = Variation::decode(&key, &signer).unwrap();
        assert_eq!(decoded, variation);
        assert_eq!(decoded.digest().unwrap(), variation.digest().unwrap());
    }

    #[test]
    fn test_key_carries_purpose() {
        let signer = signer();
        // A token signed without the variation purpose must not decode.
        let forged = signer
            .sign(&json!({"rotate": 90}), SignOptions::default())
            .unwrap();
        assert!(Variation::decode(&forged, &signer).is_err());
    }

    #[test]
    fn test_wrap_accepts_all_shapes() {
        let signer = signer();
        let variation = Variation::new(map(json!({"rotate": 180})));

        let from_value = Variation::wrap(variation.clone(), &signer).unwrap();
        assert_eq!(from_value, variation);

        let key = variation.key(&signer).unwrap();
        let from_key = Variation::wrap(key, &signer).unwrap();
        assert_eq!(from_key, variation);

        let from_map = Variation::wrap(map(json!({"rotate": 180})), &signer).unwrap();
        assert_eq!(from_map, variation);
    }

    #[test]
    fn test_default_to_is_left_biased() {
        let variation = Variation::new(map(json!({"format": "png", "rotate": 90})));
        let merged = variation.default_to(&map(json!({"format": "webp", "resize_to_limit": [5, 5]})));

        assert_eq!(merged.output_format(), "png");
        assert!(merged.transformations().contains_key("resize_to_limit"));
    }

    #[test]
    fn test_output_format_and_mime_type() {
        let plain = Variation::new(Map::new());
        assert_eq!(plain.output_format(), "png");
        assert_eq!(plain.mime_type("application/octet-stream"), "image/png");

        let webp = Variation::new(map(json!({"format": "webp"})));
        assert_eq!(webp.mime_type("application/octet-stream"), "image/webp");

        let bogus = Variation::new(map(json!({"format": "zzz9"})));
        assert_eq!(bogus.mime_type("application/octet-stream"), "application/octet-stream");
    }

    #[test]
    fn test_steps_skip_format_without_mutation() {
        let variation = Variation::new(map(json!({"rotate": 90, "format": "webp", "resize_to_fit": [4, 4]})));
        let names: Vec<&str> = variation.steps().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["rotate", "resize_to_fit"]);
        // The map still holds the format; digests stay stable across steps().
        assert!(variation.transformations().contains_key("format"));
    }
}
