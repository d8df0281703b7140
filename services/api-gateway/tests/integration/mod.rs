//! Integration Tests Module
//!
//! The full router driven in-process with `oneshot`; internal collaborators
//! are simulated with wiremock.


use api_gateway::config::{Config, PrincipalConfig, ServiceUrls};
use api_gateway::credentials::Role;
use api_gateway::{AppState, build_router};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, header};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

pub const SIGNING_SECRET: &str = "integration-signing-secret-0123456789abcdef";

pub fn principals() -> Vec<PrincipalConfig> {
    vec![
        PrincipalConfig {
            username: "admin".to_string(),
            user_id: 1,
            role: Role::Admin,
            password: SecretString::from("admin123".to_string()),
        },
        PrincipalConfig {
            username: "user".to_string(),
            user_id: 2,
            role: Role::User,
            password: SecretString::from("user123".to_string()),
        },
    ]
}

/// Every collaborator at `base`.
pub fn config_with_upstream(base: &str) -> Config {
    let url = Url::parse(base).unwrap();
    Config::new(
        SecretString::from(SIGNING_SECRET.to_string()),
        principals(),
        ServiceUrls {
            assets: url.clone(),
            files: url.clone(),
            transcode: url.clone(),
            search: url,
        },
    )
}

pub fn app(config: &Config) -> Router {
    build_router(AppState::from_config(config).unwrap(), config)
}

pub async fn send(app: &Router, request: Request<Body>) -> (u16, Response<Body>) {
    let response = app.clone().oneshot(request).await.unwrap();
    (response.status().as_u16(), response)
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "username": username, "password": password }).to_string(),
        ))
        .unwrap()
}

pub async fn login_token(app: &Router, username: &str, password: &str) -> String {
    let (status, response) = send(app, login_request(username, password)).await;
    assert_eq!(status, 200);
    json_body(response).await["token"].as_str().unwrap().to_string()
}

pub fn authed(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}
