//! Multipart upload parsing with size and type allow-lists.

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;

use convhub_convert::UploadedFile;
use convhub_core::error::AppError;
use convhub_core::types::format::{CapabilityTable, Format, FormatFamily};

/// Which uploads a route accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFilter {
    /// Any extension that appears as a source in the capability table.
    SupportedExtension,
    /// Only the image MIME types jpeg, png, gif, and webp.
    ImageMime,
}

impl FileFilter {
    fn accepts(&self, name: &str, mime: Option<&str>) -> bool {
        match self {
            Self::SupportedExtension => {
                Format::from_filename(name).is_some_and(CapabilityTable::is_source)
            }
            Self::ImageMime => mime
                .and_then(Format::from_mime)
                .is_some_and(|f| f.family() == FormatFamily::Image),
        }
    }
}

/// Upload rules for one route family.
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    /// Multipart field carrying the file.
    pub field: &'static str,
    /// Maximum file size in bytes.
    pub max_bytes: u64,
    /// Type allow-list.
    pub filter: FileFilter,
}

impl UploadPolicy {
    /// Primary routes: field `file`, extension allow-list.
    pub fn primary(max_bytes: u64) -> Self {
        Self {
            field: "file",
            max_bytes,
            filter: FileFilter::SupportedExtension,
        }
    }

    /// Image-only routes: field `image`, MIME allow-list.
    pub fn image(max_bytes: u64) -> Self {
        Self {
            field: "image",
            max_bytes,
            filter: FileFilter::ImageMime,
        }
    }
}

/// A parsed multipart form: at most one file plus text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    /// The uploaded file, if present.
    pub file: Option<UploadedFile>,
    /// Text fields by name; the last value wins.
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// Read every part of `multipart` under `policy`.
    pub async fn read(mut multipart: Multipart, policy: UploadPolicy) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or("").to_string();

            if name == policy.field {
                let file_name = field.file_name().unwrap_or("").to_string();
                let mime_type = field.content_type().map(String::from);

                if !policy.filter.accepts(&file_name, mime_type.as_deref()) {
                    return Err(AppError::validation(format!(
                        "Unsupported file type: {}",
                        if file_name.is_empty() { "<unnamed>" } else { file_name.as_str() }
                    )));
                }

                let data = field.bytes().await.map_err(multipart_error)?;
                if data.len() as u64 > policy.max_bytes {
                    return Err(AppError::payload_too_large(format!(
                        "File exceeds the {} byte limit",
                        policy.max_bytes
                    )));
                }

                form.file = Some(UploadedFile::new(file_name, mime_type, data));
            } else if field.file_name().is_none() {
                let value = field.text().await.map_err(multipart_error)?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// The file, or a validation error.
    pub fn require_file(&mut self) -> Result<UploadedFile, AppError> {
        self.file
            .take()
            .ok_or_else(|| AppError::validation("Please select a file to upload"))
    }

    /// A non-empty text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// A required non-empty text field.
    pub fn require_text(&self, name: &str) -> Result<&str, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::validation(format!("Field '{name}' is required")))
    }

    /// An integer field; `None` when absent or unparseable.
    pub fn int(&self, name: &str) -> Option<i64> {
        self.text(name).and_then(|v| v.parse().ok())
    }

    /// A float field; `None` when absent, unparseable, or not finite.
    pub fn float(&self, name: &str) -> Option<f64> {
        self.text(name)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::payload_too_large("Uploaded file is too large")
    } else {
        AppError::validation(format!("Malformed multipart body: {}", err.body_text()))
    }
}
