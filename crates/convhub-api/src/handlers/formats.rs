//! Capability table endpoint.

use axum::Json;

use convhub_core::types::format::{CapabilityTable, Format};

use crate::dto::response::{ApiResponse, FormatEntry};

/// GET /api/formats
pub async fn list_formats() -> Json<ApiResponse<Vec<FormatEntry>>> {
    let entries = Format::ALL
        .into_iter()
        .filter(|f| CapabilityTable::is_source(*f))
        .map(|source| FormatEntry {
            source,
            family: source.family(),
            targets: CapabilityTable::targets(source).to_vec(),
        })
        .collect();

    Json(ApiResponse::ok(entries))
}
