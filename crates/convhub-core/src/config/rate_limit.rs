//! Per-client rate limiting configuration.

use serde::{Deserialize, Serialize};

/// Token bucket settings applied per client IP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Requests allowed per window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Window length in seconds.
    #[serde(default = "default_window")]
    pub window_seconds: u64,
}

impl RateLimitConfig {
    /// Token refill rate per second implied by the window.
    pub fn refill_per_second(&self) -> f64 {
        if self.window_seconds == 0 {
            return f64::from(self.max_requests);
        }
        f64::from(self.max_requests) / self.window_seconds as f64
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_requests: default_max_requests(),
            window_seconds: default_window(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_max_requests() -> u32 {
    100
}

fn default_window() -> u64 {
    15 * 60
}
