//! Image processors.

use std::io::Cursor;

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};

use holdfast_core::ProcessorKind;

use crate::error::{MediaError, MediaResult};
use crate::transformer::Transformation;

/// Applies transformations to a loaded image.
pub trait Processor: Send {
    /// Processor identifier used in error messages.
    fn name(&self) -> &'static str;

    /// Load source bytes, replacing any previously loaded image.
    fn source(&mut self, bytes: &[u8]) -> MediaResult<()>;

    /// Apply one transformation to the loaded image.
    fn apply(&mut self, transformation: &Transformation) -> MediaResult<()>;

    /// Encode the current image in the named format.
    fn save(&mut self, format: &str) -> MediaResult<Bytes>;
}

/// Build the configured processor.
pub fn build_processor(kind: ProcessorKind) -> Box<dyn Processor> {
    match kind {
        ProcessorKind::Pixel => Box::new(PixelProcessor::new()),
    }
}

/// In-process pixel operations via the `image` crate.
#[derive(Default)]
pub struct PixelProcessor {
    image: Option<DynamicImage>,
}

impl PixelProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    fn image_mut(&mut self) -> MediaResult<&mut DynamicImage> {
        self.image.as_mut().ok_or_else(|| {
            MediaError::Image(image::ImageError::Parameter(
                image::error::ParameterError::from_kind(
                    image::error::ParameterErrorKind::Generic(
                        "no source image loaded".to_string(),
                    ),
                ),
            ))
        })
    }
}

impl Processor for PixelProcessor {
    fn name(&self) -> &'static str {
        "pixel"
    }

    fn source(&mut self, bytes: &[u8]) -> MediaResult<()> {
        let image = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(image::ImageError::IoError)?
            .decode()?;
        self.image = Some(image);
        Ok(())
    }

    fn apply(&mut self, transformation: &Transformation) -> MediaResult<()> {
        let image = self.image_mut()?;
        let next = match *transformation {
            Transformation::ResizeToFit { width, height } => {
                // resize() scales in both directions to the largest size
                // fitting the box with aspect preserved.
                image.resize(width, height, FilterType::Lanczos3)
            }
            Transformation::ResizeToLimit { width, height } => {
                if image.width() <= width && image.height() <= height {
                    return Ok(());
                }
                image.resize(width, height, FilterType::Lanczos3)
            }
            Transformation::Rotate { quarter_turns } => match quarter_turns % 4 {
                1 => image.rotate90(),
                2 => image.rotate180(),
                3 => image.rotate270(),
                _ => return Ok(()),
            },
        };
        self.image = Some(next);
        Ok(())
    }

    fn save(&mut self, format: &str) -> MediaResult<Bytes> {
        let image_format = ImageFormat::from_extension(format)
            .ok_or_else(|| MediaError::UnknownFormat(format.to_string()))?;
        let image = self.image_mut()?;
        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), image_format)?;
        Ok(Bytes::from(buf))
    }
}
