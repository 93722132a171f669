//! Unified error type for the conversion crate.
//!
//! Parameter problems map to validation errors; everything the codecs
//! report maps to a conversion error whose client message names only the
//! operation, never the library's own text.

use std::path::PathBuf;

use convhub_core::error::{AppError, ErrorKind};
use convhub_core::types::format::Format;
use thiserror::Error;

/// Errors produced by document and image converters.
#[derive(Debug, Error)]
pub enum ConversionError {
    // --- Parameter errors ---
    /// The upload carried no bytes.
    #[error("Uploaded file is empty")]
    EmptyInput,

    /// Compression quality outside 0..=100 or not an integer.
    #[error("Invalid compression quality: {value}")]
    InvalidQuality {
        /// The rejected value as received.
        value: String,
    },

    /// Crop width or height missing or zero.
    #[error("Crop width and height are required")]
    MissingCropSize,

    /// Watermark text missing or blank.
    #[error("Watermark text is required")]
    MissingWatermarkText,

    /// Watermark opacity outside 0.0..=1.0.
    #[error("Invalid watermark opacity: {value}")]
    InvalidOpacity {
        /// The rejected value.
        value: f32,
    },

    /// Generic parameter validation failure from `validator`.
    #[error("Invalid parameters: {0}")]
    InvalidParams(#[from] validator::ValidationErrors),

    /// The format pair is not in the capability table.
    #[error("Conversion from {source_format} to {target} is not supported")]
    Unsupported {
        /// Source format.
        source_format: Format,
        /// Requested target format.
        target: Format,
    },

    /// The upload's format could not be determined or is not accepted.
    #[error("Unrecognized file format: {name}")]
    UnrecognizedFormat {
        /// File name or format string as received.
        name: String,
    },

    // --- Codec errors ---
    /// Input bytes could not be decoded as an image.
    #[error("Failed to decode image: {0}")]
    ImageDecode(#[source] image::ImageError),

    /// Encoding an image failed.
    #[error("Failed to encode {format} image: {source}")]
    ImageEncode {
        /// Target format.
        format: Format,
        /// Underlying codec error.
        #[source]
        source: image::ImageError,
    },

    /// The crop rectangle lies outside the image.
    #[error(
        "Crop region {width}x{height}+{left}+{top} exceeds image bounds {image_width}x{image_height}"
    )]
    CropOutOfBounds {
        /// Left offset.
        left: u32,
        /// Top offset.
        top: u32,
        /// Region width.
        width: u32,
        /// Region height.
        height: u32,
        /// Image width.
        image_width: u32,
        /// Image height.
        image_height: u32,
    },

    /// Watermark overlay rendering failed.
    #[error("Failed to render watermark: {reason}")]
    Watermark {
        /// What went wrong.
        reason: String,
    },

    /// A document codec failed for a format pair.
    #[error("Converting {source_format} to {target} failed: {reason}")]
    Document {
        /// Source format.
        source_format: Format,
        /// Target format.
        target: Format,
        /// Underlying failure description.
        reason: String,
    },

    // --- Generic errors ---
    /// Scratch file I/O failed.
    #[error("Scratch file error at {path}: {source}")]
    Scratch {
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tokio task join error.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ConversionError {
    /// Wrap a codec failure for a document format pair.
    pub fn document(source: Format, target: Format, reason: impl ToString) -> Self {
        Self::Document {
            source_format: source,
            target,
            reason: reason.to_string(),
        }
    }

    /// Whether the error stems from client input rather than a codec failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput
                | Self::InvalidQuality { .. }
                | Self::MissingCropSize
                | Self::MissingWatermarkText
                | Self::InvalidOpacity { .. }
                | Self::InvalidParams(_)
        )
    }

    /// Message that is safe to send to clients.
    fn public_message(&self) -> String {
        match self {
            Self::Unsupported { .. } | Self::UnrecognizedFormat { .. } => self.to_string(),
            Self::Document {
                source_format,
                target,
                ..
            } => format!("Failed to convert {source_format} to {target}"),
            Self::ImageDecode(_) => "The uploaded file is not a readable image".to_string(),
            Self::ImageEncode { format, .. } => format!("Failed to encode image as {format}"),
            Self::CropOutOfBounds { .. } => "Image crop failed".to_string(),
            Self::Watermark { .. } => "Adding watermark failed".to_string(),
            Self::Scratch { .. } | Self::Io(_) | Self::Join(_) => {
                "File processing failed".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl From<ConversionError> for AppError {
    fn from(err: ConversionError) -> Self {
        let kind = if err.is_validation() {
            ErrorKind::Validation
        } else if matches!(
            err,
            ConversionError::Unsupported { .. } | ConversionError::UnrecognizedFormat { .. }
        ) {
            ErrorKind::UnsupportedFormat
        } else if matches!(err, ConversionError::Scratch { .. } | ConversionError::Io(_)) {
            ErrorKind::Storage
        } else {
            ErrorKind::Conversion
        };
        let message = err.public_message();
        AppError::with_source(kind, message, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_errors_map_to_validation() {
        let err: AppError = ConversionError::InvalidQuality {
            value: "101".to_string(),
        }
        .into();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err: AppError = ConversionError::MissingCropSize.into();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_codec_error_hides_library_text() {
        let err: AppError =
            ConversionError::document(Format::Pdf, Format::Docx, "xref table corrupt").into();
        assert_eq!(err.kind, ErrorKind::Conversion);
        assert_eq!(err.message, "Failed to convert pdf to docx");
        assert!(err.source.is_some());
    }
}
