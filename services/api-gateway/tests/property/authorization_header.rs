//! Authorization Header Property Tests
//!
//! Arbitrary `Authorization` values never get past the guard and never
//! produce a server error.

use std::sync::Arc;

use api_gateway::guard::{RequestGuard, RouteAccess};
use api_gateway::jwt::{DEFAULT_TOKEN_TTL_SECONDS, TokenCodec};
use api_gateway::middleware::GuardLayer;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode, header};
use axum::routing::get;
use proptest::prelude::*;
use secrecy::SecretString;
use tower::ServiceExt;

fn guarded_app() -> Router {
    let codec = TokenCodec::new(
        &SecretString::from("header-property-secret-0123456789abcdef".to_string()),
        DEFAULT_TOKEN_TTL_SECONDS,
    );
    Router::new()
        .route("/protected", get(|| async { "inside" }))
        .route_layer(GuardLayer::new(
            Arc::new(RequestGuard::new(Arc::new(codec))),
            RouteAccess::Authenticated,
        ))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: forged bearer values are always 401
    #[test]
    fn prop_arbitrary_authorization_rejected(
        scheme in prop_oneof![Just("Bearer "), Just("bearer "), Just("Basic "), Just("")],
        value in "[ -~]{0,200}",
    ) {
        let header_value = format!("{scheme}{value}");
        let Ok(header_value) = HeaderValue::from_str(&header_value) else {
            return Ok(());
        };
        let request = Request::builder()
            .uri("/protected")
            .header(header::AUTHORIZATION, header_value)
            .body(Body::empty())
            .unwrap();

        let response = tokio_test::block_on(guarded_app().oneshot(request)).unwrap();
        prop_assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
