//! Response DTOs.

use serde::{Deserialize, Serialize};

use convhub_core::types::format::{Format, FormatFamily};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"` while the server is serving requests.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Seconds since the server started.
    pub uptime_seconds: u64,
}

/// One row of the capability table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatEntry {
    /// Source format.
    pub source: Format,
    /// Converter family.
    pub family: FormatFamily,
    /// Targets reachable from `source`.
    pub targets: Vec<Format>,
}
