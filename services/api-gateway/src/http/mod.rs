//! HTTP surface: application state and router assembly.
//!
//! | Route                       | Access        | Budget    |
//! |-----------------------------|---------------|-----------|
//! | `GET /health`               | public        | none      |
//! | `POST /auth/login`          | public        | login     |
//! | `POST /auth/verify`         | authenticated | verify    |
//! | `GET /auth/me`              | authenticated | me        |
//! | `GET /api/status`           | admin         | status    |
//! | `/api/{service}[/*subpath]` | authenticated | {service} |

pub mod auth;
pub mod health;
pub mod proxy;

use std::sync::Arc;

use anyhow::Context as _;
use axum::Router;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, Method, Uri};
use axum::routing::{get, post};
use rust_common::build_http_client;
use tower_http::cors::CorsLayer;

use crate::authenticator::Authenticator;
use crate::config::Config;
use crate::credentials::Role;
use crate::error::GatewayError;
use crate::guard::{RequestGuard, RouteAccess};
use crate::jwt::TokenCodec;
use crate::middleware::{CallerKeySource, GuardLayer, RateLimitLayer, TimeoutLayer, TracingLayer};
use crate::rate_limiter::{LimitedRoute, RateLimiter};

use self::proxy::{Upstream, UpstreamProxy};

/// Shared, immutable-after-startup state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Login handling
    pub authenticator: Arc<Authenticator>,
    /// Token and role checks
    pub guard: Arc<RequestGuard>,
    /// Shared by every rate-limited route
    pub limiter: Arc<RateLimiter>,
    /// Collaborator forwarding and health probes
    pub proxy: Arc<UpstreamProxy>,
    /// How callers are keyed for rate limiting
    pub key_source: CallerKeySource,
}

impl AppState {
    /// Wire every component from `config`.
    ///
    /// # Errors
    ///
    /// Fails if the credential store rejects the configured principals or
    /// the outbound client cannot be built.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = config
            .credential_store()
            .context("invalid principal configuration")?;
        let codec = Arc::new(TokenCodec::new(&config.jwt_secret, config.token_ttl_seconds));
        let client =
            build_http_client(&config.http_config()).context("failed to build upstream client")?;

        Ok(Self {
            authenticator: Arc::new(Authenticator::new(Arc::new(store), Arc::clone(&codec))),
            guard: Arc::new(RequestGuard::new(codec)),
            limiter: Arc::new(RateLimiter::new(config.rate_limits.clone())),
            proxy: Arc::new(UpstreamProxy::new(
                client,
                config.services.clone(),
                config.health_check_timeout(),
            )),
            key_source: config.caller_key_source(),
        })
    }

    fn rate_limit(&self, route: LimitedRoute) -> RateLimitLayer {
        RateLimitLayer::new(Arc::clone(&self.limiter), route, self.key_source)
    }

    fn guarded(&self, access: RouteAccess) -> GuardLayer {
        GuardLayer::new(Arc::clone(&self.guard), access)
    }
}

/// Assemble the full router.
///
/// Each route group gets its own `route_layer`s; the rate limit is added last
/// so it runs before the guard and throttles unauthenticated floods too.
pub fn build_router(state: AppState, config: &Config) -> Router {
    let login = Router::new()
        .route("/auth/login", post(auth::login))
        .route_layer(state.rate_limit(LimitedRoute::Login));

    let verify = Router::new()
        .route("/auth/verify", post(auth::verify))
        .route_layer(state.guarded(RouteAccess::Authenticated))
        .route_layer(state.rate_limit(LimitedRoute::Verify));

    let me = Router::new()
        .route("/auth/me", get(auth::me))
        .route_layer(state.guarded(RouteAccess::Authenticated))
        .route_layer(state.rate_limit(LimitedRoute::Me));

    let status = Router::new()
        .route("/api/status", get(health::status))
        .route_layer(state.guarded(RouteAccess::RequireRole(Role::Admin)))
        .route_layer(state.rate_limit(LimitedRoute::Status));

    let mut router = Router::new()
        .route("/health", get(health::health))
        .merge(login)
        .merge(verify)
        .merge(me)
        .merge(status);

    for upstream in Upstream::ALL {
        router = router.merge(proxy_routes(&state, upstream));
    }

    router
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(CorsLayer::permissive())
        .layer(TracingLayer::new("api-gateway"))
        .with_state(state)
}

fn proxy_routes(state: &AppState, upstream: Upstream) -> Router<AppState> {
    let forward = move |State(state): State<AppState>,
                        method: Method,
                        uri: Uri,
                        headers: HeaderMap,
                        body: Result<Bytes, BytesRejection>| async move {
        let body = body.map_err(GatewayError::from)?;
        state.proxy.forward(upstream, method, &uri, &headers, body).await
    };

    let prefix = upstream.prefix();
    Router::new()
        .route(&prefix, get(forward.clone()).post(forward.clone()))
        .route(
            &format!("{prefix}/*subpath"),
            get(forward.clone())
                .post(forward.clone())
                .put(forward.clone())
                .delete(forward),
        )
        .route_layer(state.guarded(RouteAccess::Authenticated))
        .route_layer(state.rate_limit(upstream.limited_route()))
}

async fn not_found() -> GatewayError {
    GatewayError::NotFound
}

async fn method_not_allowed() -> GatewayError {
    GatewayError::MethodNotAllowed
}
