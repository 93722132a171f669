//! Route definitions for the ConvHub HTTP API.
//!
//! Conversion routes are mounted under `/api` and again under
//! `/api/convert`; the image-only routes live under `/api/image`.

use std::any::Any;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use convhub_core::error::AppError;

use crate::error::ApiError;
use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Room for multipart boundaries and text fields on top of the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let max_upload = state.config.upload.max_file_size_bytes as usize;
    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    let api_routes = Router::new()
        .merge(conversion_routes(""))
        .merge(conversion_routes("/convert"))
        .merge(image_routes())
        .merge(info_routes());

    let mut router = Router::new().nest("/api", api_routes);

    if state.config.upload.serve_temp_dir {
        router = router.nest_service("/temp", ServeDir::new(&state.config.upload.temp_dir));
    }

    router
        .layer(DefaultBodyLimit::max(
            max_upload.saturating_add(MULTIPART_OVERHEAD),
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::rate_limit,
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Convert, compress, crop, and watermark under `prefix`.
fn conversion_routes(prefix: &str) -> Router<AppState> {
    Router::new()
        .route(&format!("{prefix}/convert"), post(handlers::convert::convert))
        .route(&format!("{prefix}/compress"), post(handlers::image::compress))
        .route(&format!("{prefix}/crop"), post(handlers::image::crop))
        .route(&format!("{prefix}/watermark"), post(handlers::image::watermark))
}

/// Deprecated image-only routes (multipart field `image`).
fn image_routes() -> Router<AppState> {
    Router::new()
        .route("/image/convert", post(handlers::convert::image_convert))
        .route("/image/compress", post(handlers::image::image_compress))
        .route("/image/crop", post(handlers::image::image_crop))
        .route("/image/watermark", post(handlers::image::image_watermark))
}

/// Capability table and health.
fn info_routes() -> Router<AppState> {
    Router::new()
        .route("/formats", get(handlers::formats::list_formats))
        .route("/health", get(handlers::health::health))
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Handler panicked");

    ApiError(AppError::internal("Internal server error")).into_response()
}
