//! Entry point used by the HTTP layer: validates a conversion request
//! against the capability table and routes it to the document pipeline or
//! the image processor.

use convhub_core::config::ConversionConfig;
use convhub_core::types::format::{CapabilityTable, Format, FormatFamily};
use tracing::info;

use crate::error::ConversionError;
use crate::image::{CompressParams, CropParams, ImageProcessor, WatermarkParams};
use crate::models::{ConversionOutput, ProcessedImage, UploadedFile};
use crate::pipeline::DocumentConverter;
use crate::scratch::ScratchDir;

/// Conversion dispatcher shared by all requests.
#[derive(Debug, Clone)]
pub struct ConversionService {
    documents: DocumentConverter,
    images: ImageProcessor,
}

impl ConversionService {
    /// Build the service from configuration.
    pub fn new(config: &ConversionConfig, scratch: ScratchDir) -> Self {
        Self {
            documents: DocumentConverter::new(config),
            images: ImageProcessor::new(scratch, config),
        }
    }

    /// Build the service from preconstructed parts.
    pub fn from_parts(documents: DocumentConverter, images: ImageProcessor) -> Self {
        Self { documents, images }
    }

    /// Image processor used for compress, crop, and watermark.
    pub fn images(&self) -> &ImageProcessor {
        &self.images
    }

    /// Convert an upload to the format named by `target`.
    pub async fn convert_to(
        &self,
        file: &UploadedFile,
        target: &str,
    ) -> Result<ConversionOutput, ConversionError> {
        let target =
            Format::from_extension(target.trim()).ok_or_else(|| ConversionError::UnrecognizedFormat {
                name: target.to_string(),
            })?;
        self.convert(file, target).await
    }

    /// Convert an upload to `target`.
    ///
    /// The pair is checked against the capability table before any
    /// converter runs.
    pub async fn convert(
        &self,
        file: &UploadedFile,
        target: Format,
    ) -> Result<ConversionOutput, ConversionError> {
        let source = file
            .source_format()
            .ok_or_else(|| ConversionError::UnrecognizedFormat {
                name: file.name.clone(),
            })?;

        // An empty text document is still a document; an empty image is not.
        if file.bytes.is_empty() && source.family() == FormatFamily::Image {
            return Err(ConversionError::EmptyInput);
        }

        if !CapabilityTable::supports(source, target) {
            return Err(ConversionError::Unsupported {
                source_format: source,
                target,
            });
        }

        let bytes = match source.family() {
            FormatFamily::Document => {
                let documents = self.documents.clone();
                let input = file.bytes.clone();
                let out = tokio::task::spawn_blocking(move || {
                    documents.convert(source, target, &input)
                })
                .await??;
                bytes::Bytes::from(out)
            }
            FormatFamily::Image => self.images.convert(file.bytes.clone(), target).await?,
        };

        info!(
            file = %file.name,
            source = %source,
            target = %target,
            size = bytes.len(),
            "File converted"
        );

        Ok(ConversionOutput::new(target, bytes))
    }

    /// Compress an image.
    pub async fn compress(
        &self,
        file: &UploadedFile,
        params: CompressParams,
    ) -> Result<ProcessedImage, ConversionError> {
        self.images.compress(file, params).await
    }

    /// Crop an image.
    pub async fn crop(
        &self,
        file: &UploadedFile,
        params: CropParams,
    ) -> Result<ProcessedImage, ConversionError> {
        self.images.crop(file, params).await
    }

    /// Watermark an image.
    pub async fn watermark(
        &self,
        file: &UploadedFile,
        params: WatermarkParams,
    ) -> Result<ProcessedImage, ConversionError> {
        self.images.watermark(file, params).await
    }
}
