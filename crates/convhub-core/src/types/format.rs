//! File formats and the static conversion capability table.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Broad family a format belongs to; decides which converter handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatFamily {
    /// Text documents (pdf, txt, docx, html).
    Document,
    /// Raster images (jpg, png, webp, gif).
    Image,
}

/// Every file format ConvHub accepts or produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Portable Document Format
    Pdf,
    /// Plain UTF-8 text
    Txt,
    /// Office Open XML word-processing document
    Docx,
    /// HTML document
    Html,
    /// JPEG image, `.jpg` spelling
    Jpg,
    /// JPEG image, `.jpeg` spelling
    Jpeg,
    /// PNG image
    Png,
    /// WebP image
    Webp,
    /// GIF image
    Gif,
}

impl Format {
    /// All formats, in capability-table order.
    pub const ALL: [Format; 9] = [
        Self::Pdf,
        Self::Txt,
        Self::Docx,
        Self::Html,
        Self::Jpg,
        Self::Jpeg,
        Self::Png,
        Self::Webp,
        Self::Gif,
    ];

    /// Determine the format from a bare extension (with or without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Txt),
            "docx" => Some(Self::Docx),
            "html" | "htm" => Some(Self::Html),
            "jpg" => Some(Self::Jpg),
            "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Determine the format from a file name's extension.
    pub fn from_filename(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Determine the format from a MIME type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "application/pdf" => Some(Self::Pdf),
            "text/plain" => Some(Self::Txt),
            "text/html" => Some(Self::Html),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Docx)
            }
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Lowercase extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Txt => "txt",
            Self::Docx => "docx",
            Self::Html => "html",
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }

    /// Which converter family handles this format.
    pub fn family(&self) -> FormatFamily {
        match self {
            Self::Pdf | Self::Txt | Self::Docx | Self::Html => FormatFamily::Document,
            Self::Jpg | Self::Jpeg | Self::Png | Self::Webp | Self::Gif => FormatFamily::Image,
        }
    }

    /// Collapse synonyms (`jpeg` → `jpg`) for table lookups.
    pub fn canonical(&self) -> Self {
        match self {
            Self::Jpeg => Self::Jpg,
            other => *other,
        }
    }

    /// Content type sent with a converted file of this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Txt => "text/plain",
            Self::Html => "text/html; charset=utf-8",
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Self::Jpg | Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim())
            .ok_or_else(|| AppError::unsupported_format(format!("Unsupported format: {s}")))
    }
}

/// Content type for a client-supplied target format string.
///
/// Unknown strings fall back to `application/octet-stream`.
pub fn content_type_for(target: &str) -> &'static str {
    Format::from_extension(target)
        .map(|f| f.content_type())
        .unwrap_or("application/octet-stream")
}

const DOCUMENT_TARGETS: [(Format, &[Format]); 4] = [
    (Format::Pdf, &[Format::Txt, Format::Docx, Format::Html]),
    (Format::Txt, &[Format::Pdf, Format::Docx, Format::Html]),
    (Format::Docx, &[Format::Pdf, Format::Txt, Format::Html]),
    (Format::Html, &[Format::Pdf, Format::Txt, Format::Docx]),
];

const IMAGE_TARGETS: [(Format, &[Format]); 4] = [
    (Format::Jpg, &[Format::Png, Format::Webp, Format::Gif]),
    (Format::Png, &[Format::Jpg, Format::Webp, Format::Gif]),
    (Format::Webp, &[Format::Jpg, Format::Png, Format::Gif]),
    (Format::Gif, &[Format::Jpg, Format::Png, Format::Webp]),
];

/// Static mapping of source format → convertible target formats.
///
/// Documents form a complete graph over pdf/txt/docx/html and images over
/// jpg/png/webp/gif; `jpeg` is a synonym of `jpg` on both sides. There are
/// no self-loops and no edges between families.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityTable;

impl CapabilityTable {
    /// Whether `source` can be converted to `target`.
    pub fn supports(source: Format, target: Format) -> bool {
        Self::targets(source).contains(&target.canonical())
    }

    /// Canonical targets reachable from `source`, in table order.
    pub fn targets(source: Format) -> &'static [Format] {
        let source = source.canonical();
        DOCUMENT_TARGETS
            .iter()
            .chain(IMAGE_TARGETS.iter())
            .find(|(s, _)| *s == source)
            .map(|(_, t)| *t)
            .unwrap_or(&[])
    }

    /// Whether the format may appear as an upload source at all.
    pub fn is_source(format: Format) -> bool {
        !Self::targets(format).is_empty()
    }

    /// Validate a pair, returning an unsupported-format error otherwise.
    pub fn check(source: Format, target: Format) -> Result<(), AppError> {
        if Self::supports(source, target) {
            Ok(())
        } else {
            Err(AppError::unsupported_format(format!(
                "Conversion from {source} to {target} is not supported"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_document_graph_is_complete_without_self_loops() {
        let docs = [Format::Pdf, Format::Txt, Format::Docx, Format::Html];
        for s in docs {
            for t in docs {
                assert_eq!(CapabilityTable::supports(s, t), s != t, "{s} -> {t}");
            }
        }
    }

    #[test]
    fn test_jpeg_synonym() {
        assert!(CapabilityTable::supports(Format::Jpeg, Format::Png));
        assert!(CapabilityTable::supports(Format::Png, Format::Jpeg));
        assert!(!CapabilityTable::supports(Format::Jpeg, Format::Jpg));
    }

    #[test]
    fn test_no_cross_family_edges() {
        assert!(!CapabilityTable::supports(Format::Pdf, Format::Png));
        assert!(!CapabilityTable::supports(Format::Gif, Format::Txt));
        let err = CapabilityTable::check(Format::Png, Format::Pdf).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn test_from_filename_and_mime() {
        assert_eq!(Format::from_filename("Report.PDF"), Some(Format::Pdf));
        assert_eq!(Format::from_filename("notes"), None);
        assert_eq!(Format::from_mime("image/png"), Some(Format::Png));
        assert_eq!(Format::from_mime("text/html; charset=utf-8"), Some(Format::Html));
        assert!("bmp".parse::<Format>().is_err());
    }

    #[test]
    fn test_content_type_fallback() {
        assert_eq!(content_type_for("pdf"), "application/pdf");
        assert_eq!(content_type_for("jpeg"), "image/jpeg");
        assert_eq!(content_type_for("tiff"), "application/octet-stream");
    }
}
