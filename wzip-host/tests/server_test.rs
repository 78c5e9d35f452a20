//! HTTP adapter through the router

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use common::*;
use tower::ServiceExt;
use wzip_host::adapter::server::{router, ServerConfig};
use wzip_host::ModePolicy;

fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/")
        .body(body.into())
        .unwrap()
}

#[tokio::test]
async fn test_post_returns_octet_stream() {
    let app = router(bridge(CAT_WAT), ServerConfig::default());

    let response = app.oneshot(post("hello")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/octet-stream"
    );

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"hello");
}

#[tokio::test]
async fn test_default_policy_compresses() {
    let app = router(bridge(ARGS_WAT), ServerConfig::default());

    let gz = vec![0x1F, 0x8B, 0x08, 0x00];
    let response = app.oneshot(post(gz)).await.unwrap();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"wzip\0-c\0");
}

#[tokio::test]
async fn test_infer_policy() {
    let config = ServerConfig {
        policy: ModePolicy::Infer,
        ..Default::default()
    };
    let app = router(bridge(ARGS_WAT), config);

    let gz = vec![0x1F, 0x8B, 0x08, 0x00];
    let response = app.oneshot(post(gz)).await.unwrap();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"wzip\0-d\0");
}

#[tokio::test]
async fn test_empty_body_is_valid_input() {
    let app = router(bridge(CAT_WAT), ServerConfig::default());

    let response = app.oneshot(post(Body::empty())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_sandbox_failure_is_json_500() {
    let app = router(bridge(TRAP_WAT), ServerConfig::default());

    let response = app.oneshot(post("hello")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "sandbox_failed");
    assert!(json["message"].as_str().unwrap().starts_with("Sandbox failed"));
}

#[tokio::test]
async fn test_capability_denied_is_403() {
    let app = router(bridge(DENY_WAT), ServerConfig::default());

    let response = app.oneshot(post("hello")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "capability_denied");
}

#[tokio::test]
async fn test_body_limit() {
    let config = ServerConfig {
        body_limit: 8,
        ..Default::default()
    };
    let app = router(bridge(CAT_WAT), config);

    let response = app.oneshot(post(vec![0u8; 64])).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_only_post_is_routed() {
    let app = router(bridge(CAT_WAT), ServerConfig::default());

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
