//! Middleware Unit Tests
//!
//! Each tower layer wrapped around a trivial handler.

use std::sync::Arc;

use api_gateway::guard::{RequestGuard, RouteAccess};
use api_gateway::middleware::{CallerKeySource, GuardLayer, RateLimitLayer, TracingLayer};
use api_gateway::rate_limiter::{LimitedRoute, RateLimitConfig, RateLimiter};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use axum::routing::get;
use chrono::Utc;
use tower::ServiceExt;

use super::{admin, codec};

async fn echo_headers(headers: HeaderMap) -> String {
    let mut names: Vec<String> = headers
        .iter()
        .map(|(name, value)| format!("{}={}", name, value.to_str().unwrap_or("?")))
        .collect();
    names.sort();
    names.join("\n")
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_guard_layer_rewrites_identity_headers() {
    let guard = Arc::new(RequestGuard::new(codec()));
    let app = Router::new()
        .route("/echo", get(echo_headers))
        .route_layer(GuardLayer::new(guard, RouteAccess::Authenticated));

    let token = codec().issue(&admin(), Utc::now()).unwrap().token;
    let request = Request::builder()
        .uri("/echo")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header("x-user-role", "superuser")
        .header("x-username", "mallory")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let seen = body_string(response).await;
    assert!(seen.contains("x-username=admin"));
    assert!(seen.contains("x-user-role=admin"));
    assert!(seen.contains("x-user-id=1"));
    assert!(!seen.contains("mallory"));
    assert!(!seen.contains("superuser"));
    assert!(!seen.contains("authorization"));
}

#[tokio::test]
async fn test_guard_layer_rejects_without_calling_handler() {
    let guard = Arc::new(RequestGuard::new(codec()));
    let app = Router::new()
        .route("/echo", get(|| async { StatusCode::IM_A_TEAPOT }))
        .route_layer(GuardLayer::new(guard, RouteAccess::Authenticated));

    let response = app
        .oneshot(Request::builder().uri("/echo").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error"], "Authentication required");
}

#[tokio::test]
async fn test_rate_limit_layer_headers_and_denial() {
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
        me: 2,
        ..RateLimitConfig::default()
    }));
    let app = Router::new()
        .route("/me", get(|| async { "ok" }))
        .route_layer(RateLimitLayer::new(limiter, LimitedRoute::Me, CallerKeySource::PeerAddr));

    let request = || Request::builder().uri("/me").body(Body::empty()).unwrap();

    let first = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["x-ratelimit-limit"], "2");
    assert_eq!(first.headers()["x-ratelimit-remaining"], "1");

    let second = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(second.headers()["x-ratelimit-remaining"], "0");

    let third = app.oneshot(request()).await.unwrap();
    assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(third.headers().contains_key(header::RETRY_AFTER));
    let body: serde_json::Value = serde_json::from_str(&body_string(third).await).unwrap();
    assert_eq!(body["error"], "Rate limit exceeded");
}

#[tokio::test]
async fn test_tracing_layer_echoes_request_id() {
    let app = Router::new()
        .route("/ping", get(|| async { "pong" }))
        .layer(TracingLayer::new("api-gateway"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/ping")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");

    let minted = app
        .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(minted.headers().contains_key("x-request-id"));
}
