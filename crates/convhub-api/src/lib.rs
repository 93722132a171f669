//! # convhub-api
//!
//! HTTP layer for ConvHub built on Axum. Exposes the conversion and image
//! routes, the capability table, and health, with rate limiting, CORS,
//! compression, and request logging.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
