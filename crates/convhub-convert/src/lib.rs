//! # convhub-convert
//!
//! Format converters for ConvHub.
//!
//! Documents are converted by extracting an intermediate representation
//! (plain text or HTML) and rendering it into the target format. Images are
//! re-encoded, compressed, cropped, or watermarked with the `image` crate.
//! The [`ConversionService`] validates a request against the capability
//! table and routes it to the right converter.

pub mod document;
pub mod error;
pub mod image;
pub mod models;
pub mod pipeline;
pub mod scratch;
pub mod service;

pub use error::ConversionError;
pub use self::image::{Anchor, CompressParams, CropParams, ImageProcessor, WatermarkParams};
pub use models::{ConversionOutput, ProcessedImage, UploadedFile};
pub use pipeline::{DocumentConverter, Ir};
pub use service::ConversionService;
