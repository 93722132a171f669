//! Raster image operations.

pub mod params;
pub mod processor;
pub mod watermark;

pub use params::{Anchor, CompressParams, CropParams, CropRect, WatermarkParams};
pub use processor::ImageProcessor;
pub use watermark::Watermarker;
