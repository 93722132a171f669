//! Route handlers.

pub mod convert;
pub mod formats;
pub mod health;
pub mod image;

use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::extractors::UploadPolicy;
use crate::state::AppState;

/// Binary download with `Content-Type` and an attachment
/// `Content-Disposition`.
pub fn attachment(content_type: &'static str, filename: &str, body: Bytes) -> Response {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

/// Mark a response from the `/api/image/*` routes as deprecated.
pub fn deprecated(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert("deprecation", HeaderValue::from_static("true"));
    response
}

/// Policy for the primary routes (field `file`).
pub fn primary_policy(state: &AppState) -> UploadPolicy {
    UploadPolicy::primary(state.config.upload.max_file_size_bytes)
}

/// Policy for the `/api/image/*` routes (field `image`).
pub fn image_policy(state: &AppState) -> UploadPolicy {
    UploadPolicy::image(state.config.upload.max_file_size_bytes)
}
