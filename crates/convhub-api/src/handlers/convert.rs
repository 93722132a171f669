//! File conversion handlers.

use axum::extract::{Multipart, State};
use axum::response::Response;

use crate::error::ApiError;
use crate::extractors::{UploadForm, UploadPolicy};
use crate::handlers::{attachment, deprecated, image_policy, primary_policy};
use crate::state::AppState;

async fn run_convert(
    state: &AppState,
    multipart: Multipart,
    policy: UploadPolicy,
    target_field: &str,
) -> Result<Response, ApiError> {
    let mut form = UploadForm::read(multipart, policy).await?;
    let file = form.require_file()?;
    let target = form.require_text(target_field)?;

    let output = state.conversion.convert_to(&file, target).await?;

    Ok(attachment(
        output.content_type,
        &output.attachment_name(),
        output.bytes,
    ))
}

/// POST /api/convert: multipart `file` + `targetFormat`
pub async fn convert(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let policy = primary_policy(&state);
    run_convert(&state, multipart, policy, "targetFormat").await
}

/// POST /api/image/convert: multipart `image` + `format`
pub async fn image_convert(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let policy = image_policy(&state);
    run_convert(&state, multipart, policy, "format")
        .await
        .map(deprecated)
}
