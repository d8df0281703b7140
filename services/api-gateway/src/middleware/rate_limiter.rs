//! Rate Limiter Tower Layer
//!
//! Applies a [`RateLimiter`] budget to one route and reports the remaining
//! budget in `X-RateLimit-*` headers.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use tower::{Layer, Service};

use crate::error::GatewayError;
use crate::observability::audit;
use crate::rate_limiter::{LimitedRoute, RateLimitDecision, RateLimiter};

/// `X-RateLimit-Limit`
pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
/// `X-RateLimit-Remaining`
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const UNKNOWN_CALLER: &str = "unknown";

/// Where the caller key comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallerKeySource {
    /// Socket peer address
    #[default]
    PeerAddr,
    /// First `X-Forwarded-For` hop, falling back to the peer address
    ForwardedFor,
}

impl CallerKeySource {
    /// Derive the caller key for `req`.
    pub fn caller_key<B>(self, req: &Request<B>) -> String {
        if self == Self::ForwardedFor {
            let forwarded = req
                .headers()
                .get(X_FORWARDED_FOR)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.split(',').next())
                .map(str::trim)
                .filter(|hop| !hop.is_empty());
            if let Some(hop) = forwarded {
                return hop.to_string();
            }
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map_or_else(|| UNKNOWN_CALLER.to_string(), |info| info.0.ip().to_string())
    }
}

/// Rate limiter layer for Tower
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<RateLimiter>,
    route: LimitedRoute,
    key_source: CallerKeySource,
}

impl RateLimitLayer {
    /// Limit the wrapped routes with `route`'s budget.
    pub const fn new(limiter: Arc<RateLimiter>, route: LimitedRoute, key_source: CallerKeySource) -> Self {
        Self {
            limiter,
            route,
            key_source,
        }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            limiter: Arc::clone(&self.limiter),
            route: self.route,
            key_source: self.key_source,
        }
    }
}

/// Rate limiter service wrapper
#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: Arc<RateLimiter>,
    route: LimitedRoute,
    key_source: CallerKeySource,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let caller = self.key_source.caller_key(&req);

        match self.limiter.admit(&caller, self.route, Instant::now()) {
            RateLimitDecision::Allowed { limit, remaining } => {
                let clone = self.inner.clone();
                let mut inner = std::mem::replace(&mut self.inner, clone);

                Box::pin(async move {
                    let mut response = inner.call(req).await?;
                    let headers = response.headers_mut();
                    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
                    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
                    Ok(response)
                })
            }
            RateLimitDecision::Denied { retry_after } => {
                audit::rate_limited(&caller, self.route, retry_after);
                let mut response = GatewayError::RateLimited { retry_after }.into_response();
                response
                    .headers_mut()
                    .insert(X_RATELIMIT_REMAINING, HeaderValue::from(0_u32));
                Box::pin(async move { Ok(response) })
            }
        }
    }
}
