//! Upload limits and scratch directory configuration.

use serde::{Deserialize, Serialize};

/// Upload handling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum accepted file size in bytes (default 10 MB).
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    /// Directory for transient output files.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: String,
    /// Whether the temp directory is exposed under `/temp`.
    #[serde(default = "default_true")]
    pub serve_temp_dir: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            temp_dir: default_temp_dir(),
            serve_temp_dir: true,
        }
    }
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_temp_dir() -> String {
    "./temp".to_string()
}

fn default_true() -> bool {
    true
}
