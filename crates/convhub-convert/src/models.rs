//! Domain models: uploaded files and conversion outputs.

use std::path::Path;

use bytes::Bytes;
use serde::Serialize;

use convhub_core::types::format::Format;

/// A file received from a client, owned by a single request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original file name as sent by the client.
    pub name: String,
    /// Client-declared MIME type, if any.
    pub mime_type: Option<String>,
    /// File contents.
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Create an uploaded file.
    pub fn new(name: impl Into<String>, mime_type: Option<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            mime_type,
            bytes,
        }
    }

    /// Source format from the file extension, falling back to the MIME type.
    pub fn source_format(&self) -> Option<Format> {
        Format::from_filename(&self.name)
            .or_else(|| self.mime_type.as_deref().and_then(Format::from_mime))
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("file")
    }
}

/// Converted bytes ready to be sent back.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// Output contents.
    pub bytes: Bytes,
    /// Target format.
    pub format: Format,
    /// Content type header value.
    pub content_type: &'static str,
}

impl ConversionOutput {
    /// Wrap output bytes for a target format.
    pub fn new(format: Format, bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            format,
            content_type: format.content_type(),
        }
    }

    /// Attachment file name, `converted.<ext>`.
    pub fn attachment_name(&self) -> String {
        format!("converted.{}", self.format)
    }
}

/// Result of compress, crop, or watermark.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedImage {
    /// Generated output file name.
    pub filename: String,
    /// Encoded format of `bytes`.
    pub format: Format,
    /// Encoded image.
    #[serde(skip)]
    pub bytes: Bytes,
}

impl ProcessedImage {
    /// Content type header value.
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_format_prefers_extension() {
        let file = UploadedFile::new("photo.png", Some("image/jpeg".into()), Bytes::new());
        assert_eq!(file.source_format(), Some(Format::Png));

        let file = UploadedFile::new("blob", Some("image/webp".into()), Bytes::new());
        assert_eq!(file.source_format(), Some(Format::Webp));

        let file = UploadedFile::new("blob", None, Bytes::new());
        assert_eq!(file.source_format(), None);
    }

    #[test]
    fn test_attachment_name() {
        let out = ConversionOutput::new(Format::Html, Bytes::from_static(b"<p/>"));
        assert_eq!(out.attachment_name(), "converted.html");
        assert_eq!(out.content_type, "text/html; charset=utf-8");
    }
}
