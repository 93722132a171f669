//! Integration tests for capability listing, health, and request limits.

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};

use helpers::{Multipart, TestApp};

#[tokio::test]
async fn test_list_formats() {
    let app = TestApp::new();

    let response = app.get("/api/formats").await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    let entries = body["data"].as_array().expect("data should be an array");
    let pdf = entries
        .iter()
        .find(|e| e["source"] == "pdf")
        .expect("pdf row");
    assert_eq!(pdf["family"], "document");
    assert_eq!(pdf["targets"], serde_json::json!(["txt", "docx", "html"]));
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let response = app.get("/api/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["data"]["status"], "ok");
    assert!(response.header("x-request-id").is_some());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::new();
    let req = Request::builder()
        .uri("/api/health")
        .header("x-request-id", "trace-123")
        .body(Body::empty())
        .unwrap();

    let response = app.send(req).await;

    assert_eq!(response.header("x-request-id"), Some("trace-123"));
}

#[tokio::test]
async fn test_rate_limit_exceeded() {
    let app = TestApp::with_config(|config| {
        config.rate_limit.max_requests = 2;
    });

    let request = || {
        Request::builder()
            .uri("/api/health")
            .header("x-forwarded-for", "198.51.100.4")
            .body(Body::empty())
            .unwrap()
    };

    assert_eq!(app.send(request()).await.status, StatusCode::OK);
    assert_eq!(app.send(request()).await.status, StatusCode::OK);

    let response = app.send(request()).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.error_code().as_deref(), Some("RATE_LIMITED"));
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let app = TestApp::with_config(|config| {
        config.upload.max_file_size_bytes = 1024;
    });
    let form = Multipart::new()
        .file("file", "big.txt", "text/plain", &vec![b'a'; 4096])
        .text("targetFormat", "html");

    let response = app.post_form("/api/convert", form).await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_unknown_route() {
    let app = TestApp::new();

    let response = app.get("/api/nope").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
