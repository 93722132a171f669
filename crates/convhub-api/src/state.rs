//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use convhub_convert::ConversionService;
use convhub_convert::scratch::ScratchDir;
use convhub_core::config::AppConfig;

use crate::middleware::rate_limit::RateLimiter;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are cheap to clone across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Conversion dispatcher
    pub conversion: Arc<ConversionService>,
    /// Per-client request limiter
    pub rate_limiter: RateLimiter,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Build state from configuration, loading system fonts for watermarks.
    pub fn new(config: AppConfig) -> Self {
        let scratch = ScratchDir::new(&config.upload.temp_dir);
        let service = ConversionService::new(&config.conversion, scratch);
        Self::with_service(config, service)
    }

    /// Build state around an existing conversion service.
    pub fn with_service(config: AppConfig, service: ConversionService) -> Self {
        let rate_limiter = RateLimiter::from_config(&config.rate_limit);
        Self {
            config: Arc::new(config),
            conversion: Arc::new(service),
            rate_limiter,
            started_at: Instant::now(),
        }
    }
}
