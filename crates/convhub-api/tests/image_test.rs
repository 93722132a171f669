//! Integration tests for compress, crop, and watermark.

mod helpers;

use axum::http::StatusCode;

use helpers::{Multipart, TestApp, dimensions, png};

#[tokio::test]
async fn test_crop_png() {
    let app = TestApp::new();
    let form = Multipart::new()
        .file("file", "square.png", "image/png", &png(200, 200))
        .text("left", "50")
        .text("top", "50")
        .text("width", "100")
        .text("height", "100");

    let response = app.post_form("/api/crop", form).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("image/png"));
    assert_eq!(dimensions(&response.body), (100, 100));
    assert_eq!(app.scratch_entries(), 0);
}

#[tokio::test]
async fn test_crop_zero_width_rejected() {
    let app = TestApp::new();
    let form = Multipart::new()
        .file("file", "square.png", "image/png", &png(20, 20))
        .text("width", "0")
        .text("height", "10");

    let response = app.post_form("/api/crop", form).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_crop_outside_image_fails() {
    let app = TestApp::new();
    let form = Multipart::new()
        .file("file", "square.png", "image/png", &png(20, 20))
        .text("left", "15")
        .text("width", "10")
        .text("height", "10");

    let response = app.post_form("/api/crop", form).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.scratch_entries(), 0);
}

#[tokio::test]
async fn test_compress_keeps_png() {
    let app = TestApp::new();
    let form = Multipart::new()
        .file("file", "square.png", "image/png", &png(32, 32))
        .text("quality", "60");

    let response = app.post_form("/api/compress", form).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("image/png"));
    assert_eq!(dimensions(&response.body), (32, 32));
}

#[tokio::test]
async fn test_compress_quality_out_of_range() {
    let app = TestApp::new();
    let form = Multipart::new()
        .file("file", "square.png", "image/png", &png(8, 8))
        .text("quality", "101");

    let response = app.post_form("/api/compress", form).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_compress_default_quality() {
    let app = TestApp::new();
    let form = Multipart::new()
        .file("file", "square.png", "image/png", &png(8, 8))
        .text("quality", "not-a-number");

    let response = app.post_form("/api/compress", form).await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_watermark_draws_text() {
    let app = TestApp::new();
    let source = png(120, 80);
    let form = Multipart::new()
        .file("file", "square.png", "image/png", &source)
        .text("text", "CONFIDENTIAL")
        .text("position", "bottom-right")
        .text("opacity", "1");

    let response = app.post_form("/api/watermark", form).await;
    assert_eq!(app.scratch_entries(), 0);

    if response.status == StatusCode::INTERNAL_SERVER_ERROR {
        // No fonts installed: the failure is reported, never a blank result.
        assert_eq!(response.error_code().as_deref(), Some("CONVERSION_FAILED"));
        return;
    }
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(dimensions(&response.body), (120, 80));

    let before = image::load_from_memory(&source).unwrap().to_rgba8();
    let after = image::load_from_memory(&response.body).unwrap().to_rgba8();
    let changed = after
        .pixels()
        .zip(before.pixels())
        .filter(|(a, b)| a != b)
        .count();
    assert!(changed > 0);
}

#[tokio::test]
async fn test_watermark_requires_text() {
    let app = TestApp::new();
    let form = Multipart::new().file("file", "square.png", "image/png", &png(10, 10));

    let response = app.post_form("/api/watermark", form).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_image_crop_route() {
    let app = TestApp::new();
    let form = Multipart::new()
        .file("image", "square.png", "image/png", &png(40, 40))
        .text("width", "10")
        .text("height", "20");

    let response = app.post_form("/api/image/crop", form).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("deprecation"), Some("true"));
    assert_eq!(dimensions(&response.body), (10, 20));
}

#[tokio::test]
async fn test_image_routes_require_image_mime() {
    let app = TestApp::new();
    let form = Multipart::new()
        .file("image", "square.png", "application/octet-stream", &png(10, 10))
        .text("width", "5")
        .text("height", "5");

    let response = app.post_form("/api/image/crop", form).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
