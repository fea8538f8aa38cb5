//! Media pipeline for Holdfast: transformations, processors, and variant
//! orchestration.

pub mod attach;
pub mod blobs;
pub mod error;
pub mod processor;
pub mod transformer;
pub mod variant;

pub use attach::{attach, AttachOptions};
pub use error::{MediaError, MediaResult};
pub use processor::{build_processor, PixelProcessor, Processor};
pub use transformer::{Transformation, Transformer};
pub use variant::{representation, MediaContext, Variant, VariantTracking};
