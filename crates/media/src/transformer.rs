//! Typed transformations and the ordered pipeline driving a processor.

use bytes::Bytes;
use serde_json::Value;

use holdfast_core::Variation;

use crate::error::{MediaError, MediaResult};
use crate::processor::Processor;

/// One parsed transformation step.
///
/// Names and arguments come from untrusted variation maps; parsing is
/// explicit and anything unknown fails fast before pixels are touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transformation {
    /// Scale into the box, preserving aspect ratio. Upscales small images.
    ResizeToFit { width: u32, height: u32 },
    /// Scale down into the box if needed; never upscales.
    ResizeToLimit { width: u32, height: u32 },
    /// Lossless quarter-turn rotation.
    Rotate { quarter_turns: u8 },
}

impl Transformation {
    /// Parse a `(name, argument)` entry from a variation map.
    pub fn parse(name: &str, argument: &Value, processor: &str) -> MediaResult<Self> {
        match name {
            "resize_to_fit" => {
                let (width, height) = parse_dimensions(name, argument)?;
                Ok(Transformation::ResizeToFit { width, height })
            }
            "resize_to_limit" => {
                let (width, height) = parse_dimensions(name, argument)?;
                Ok(Transformation::ResizeToLimit { width, height })
            }
            "rotate" => {
                let degrees = parse_degrees(name, argument)?;
                Ok(Transformation::Rotate {
                    quarter_turns: ((degrees.rem_euclid(360)) / 90) as u8,
                })
            }
            _ => Err(MediaError::UnsupportedTransformation {
                name: name.to_string(),
                processor: processor.to_string(),
            }),
        }
    }
}

/// Accepts `[w, h]` or `{"width": w, "height": h}`.
fn parse_dimensions(name: &str, argument: &Value) -> MediaResult<(u32, u32)> {
    let invalid = |reason: &str| MediaError::InvalidTransformationArgs {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let (width, height) = match argument {
        Value::Array(items) if items.len() == 2 => (&items[0], &items[1]),
        Value::Object(map) => (
            map.get("width").ok_or_else(|| invalid("missing width"))?,
            map.get("height").ok_or_else(|| invalid("missing height"))?,
        ),
        _ => return Err(invalid("expected [width, height] or {width, height}")),
    };

    let width = width
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| invalid("width must be a positive integer"))?;
    let height = height
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| invalid("height must be a positive integer"))?;

    Ok((width, height))
}

/// Accepts a bare number or `{"degrees": n}`, quarter-turn multiples only.
fn parse_degrees(name: &str, argument: &Value) -> MediaResult<i64> {
    let invalid = |reason: &str| MediaError::InvalidTransformationArgs {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let degrees = match argument {
        Value::Number(_) => argument.as_i64(),
        Value::Object(map) => map.get("degrees").and_then(Value::as_i64),
        _ => None,
    }
    .ok_or_else(|| invalid("expected degrees as an integer"))?;

    if degrees % 90 != 0 {
        return Err(invalid("rotation must be a multiple of 90 degrees"));
    }
    Ok(degrees)
}

/// Runs a variation's steps, in order, through a processor.
pub struct Transformer<'a> {
    variation: &'a Variation,
}

impl<'a> Transformer<'a> {
    pub fn new(variation: &'a Variation) -> Self {
        Self { variation }
    }

    /// Load the source, apply every step, and encode in the variation's
    /// output format. The output buffer is an owned value; nothing outlives
    /// this call on error paths.
    pub fn process(&self, source: &[u8], processor: &mut dyn Processor) -> MediaResult<Bytes> {
        processor.source(source)?;
        for (name, argument) in self.variation.steps() {
            let transformation = Transformation::parse(name, argument, processor.name())?;
            processor.apply(&transformation)?;
        }
        processor.save(self.variation.output_format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_positional_and_keyword_dimensions() {
        let positional = Transformation::parse("resize_to_fit", &json!([100, 50]), "pixel").unwrap();
        let keyword =
            Transformation::parse("resize_to_fit", &json!({"width": 100, "height": 50}), "pixel")
                .unwrap();
        assert_eq!(positional, keyword);
        assert_eq!(
            positional,
            Transformation::ResizeToFit {
                width: 100,
                height: 50
            }
        );
    }

    #[test]
    fn test_parse_rotate() {
        assert_eq!(
            Transformation::parse("rotate", &json!(90), "pixel").unwrap(),
            Transformation::Rotate { quarter_turns: 1 }
        );
        assert_eq!(
            Transformation::parse("rotate", &json!({"degrees": 270}), "pixel").unwrap(),
            Transformation::Rotate { quarter_turns: 3 }
        );
        // Negative angles normalize.
        assert_eq!(
            Transformation::parse("rotate", &json!(-90), "pixel").unwrap(),
            Transformation::Rotate { quarter_turns: 3 }
        );
        assert_eq!(
            Transformation::parse("rotate", &json!(360), "pixel").unwrap(),
            Transformation::Rotate { quarter_turns: 0 }
        );
    }

    #[test]
    fn test_unknown_transformation_names_processor() {
        let err = Transformation::parse("swirl", &json!(10), "pixel").unwrap_err();
        match err {
            MediaError::UnsupportedTransformation { name, processor } => {
                assert_eq!(name, "swirl");
                assert_eq!(processor, "pixel");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_arguments_rejected() {
        assert!(Transformation::parse("resize_to_fit", &json!([100]), "pixel").is_err());
        assert!(Transformation::parse("resize_to_fit", &json!({"width": 10}), "pixel").is_err());
        assert!(Transformation::parse("resize_to_fit", &json!([0, 10]), "pixel").is_err());
        assert!(Transformation::parse("resize_to_fit", &json!([-1, 10]), "pixel").is_err());
        assert!(Transformation::parse("rotate", &json!(45), "pixel").is_err());
        assert!(Transformation::parse("rotate", &json!("90"), "pixel").is_err());
    }
}
