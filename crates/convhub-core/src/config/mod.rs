//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section; every field has a default so an empty source is valid.

pub mod app;
pub mod conversion;
pub mod logging;
pub mod rate_limit;
pub mod upload;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::conversion::ConversionConfig;
pub use self::logging::LoggingConfig;
pub use self::rate_limit::RateLimitConfig;
pub use self::upload::UploadConfig;

use crate::error::AppError;

/// Environment variable prefix for overrides, e.g. `CONVHUB__SERVER__PORT`.
pub const ENV_PREFIX: &str = "CONVHUB";

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// files (default.toml + environment overlay + environment variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Upload limits and temp directory.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Rate limiting settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Converter defaults.
    #[serde(default)]
    pub conversion: ConversionConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from `config/default.toml`, `config/{env}.toml`
    /// and `CONVHUB__*` environment variables, in that order of precedence.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from(Path::new("config"), env)
    }

    /// Same as [`AppConfig::load`] with an explicit configuration directory.
    pub fn load_from(dir: &Path, env: &str) -> Result<Self, AppError> {
        let default_path = dir.join("default");
        let env_path = dir.join(env);

        let config = config::Config::builder()
            .add_source(config::File::with_name(&default_path.to_string_lossy()).required(false))
            .add_source(config::File::with_name(&env_path.to_string_lossy()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        parsed.validate()?;
        Ok(parsed)
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.upload.max_file_size_bytes == 0 {
            return Err(AppError::configuration(
                "upload.max_file_size_bytes must be greater than zero",
            ));
        }
        if self.conversion.default_quality > 100 {
            return Err(AppError::configuration(
                "conversion.default_quality must be between 0 and 100",
            ));
        }
        if self.conversion.pdf_font_size <= 0.0 {
            return Err(AppError::configuration(
                "conversion.pdf_font_size must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(dir.path(), "test").unwrap();

        assert_eq!(config.upload.max_file_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window_seconds, 900);
        assert_eq!(config.conversion.default_quality, 80);
    }

    #[test]
    fn test_env_overlay_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "[server]\nport = 4000\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("staging.toml"), "[server]\nport = 5000\n").unwrap();

        let config = AppConfig::load_from(dir.path(), "staging").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_zero_upload_limit_rejected() {
        let mut config = AppConfig::default();
        config.upload.max_file_size_bytes = 0;
        assert!(config.validate().is_err());
    }
}
