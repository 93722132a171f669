//! Image compress, crop, and watermark handlers.
//!
//! Each operation is served under the primary routes (field `file`) and
//! the deprecated `/api/image/*` routes (field `image`) with the same
//! binary response.

use axum::extract::{Multipart, State};
use axum::response::Response;

use convhub_convert::image::params::DEFAULT_OPACITY;
use convhub_convert::{Anchor, CompressParams, CropParams, ProcessedImage, WatermarkParams};

use crate::error::ApiError;
use crate::extractors::{UploadForm, UploadPolicy};
use crate::handlers::{attachment, deprecated, image_policy, primary_policy};
use crate::state::AppState;

fn download(output: ProcessedImage) -> Response {
    attachment(output.content_type(), &output.filename, output.bytes)
}

async fn run_compress(
    state: &AppState,
    multipart: Multipart,
    policy: UploadPolicy,
) -> Result<Response, ApiError> {
    let mut form = UploadForm::read(multipart, policy).await?;
    let file = form.require_file()?;

    // Absent or unparseable quality falls back to the default; parsed
    // values outside 0..=100 are rejected by the processor.
    let quality = form
        .int("quality")
        .unwrap_or(i64::from(state.config.conversion.default_quality));

    let output = state
        .conversion
        .compress(&file, CompressParams { quality })
        .await?;
    Ok(download(output))
}

async fn run_crop(
    state: &AppState,
    multipart: Multipart,
    policy: UploadPolicy,
) -> Result<Response, ApiError> {
    let mut form = UploadForm::read(multipart, policy).await?;
    let file = form.require_file()?;

    let params = CropParams {
        width: form.float("width"),
        height: form.float("height"),
        left: form.float("left"),
        top: form.float("top"),
    };

    let output = state.conversion.crop(&file, params).await?;
    Ok(download(output))
}

async fn run_watermark(
    state: &AppState,
    multipart: Multipart,
    policy: UploadPolicy,
) -> Result<Response, ApiError> {
    let mut form = UploadForm::read(multipart, policy).await?;
    let file = form.require_file()?;

    let params = WatermarkParams {
        text: form.fields.get("text").filter(|t| !t.is_empty()).cloned(),
        position: form
            .text("position")
            .map(Anchor::parse_or_center)
            .unwrap_or_default(),
        opacity: form
            .float("opacity")
            .map(|v| v as f32)
            .unwrap_or(DEFAULT_OPACITY),
    };

    let output = state.conversion.watermark(&file, params).await?;
    Ok(download(output))
}

/// POST /api/compress: multipart `file` + optional `quality`
pub async fn compress(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let policy = primary_policy(&state);
    run_compress(&state, multipart, policy).await
}

/// POST /api/crop: multipart `file` + `width`, `height`, `left`, `top`
pub async fn crop(State(state): State<AppState>, multipart: Multipart) -> Result<Response, ApiError> {
    let policy = primary_policy(&state);
    run_crop(&state, multipart, policy).await
}

/// POST /api/watermark: multipart `file` + `text`, `position`, `opacity`
pub async fn watermark(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let policy = primary_policy(&state);
    run_watermark(&state, multipart, policy).await
}

/// POST /api/image/compress
pub async fn image_compress(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let policy = image_policy(&state);
    run_compress(&state, multipart, policy).await.map(deprecated)
}

/// POST /api/image/crop
pub async fn image_crop(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let policy = image_policy(&state);
    run_crop(&state, multipart, policy).await.map(deprecated)
}

/// POST /api/image/watermark
pub async fn image_watermark(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let policy = image_policy(&state);
    run_watermark(&state, multipart, policy)
        .await
        .map(deprecated)
}
