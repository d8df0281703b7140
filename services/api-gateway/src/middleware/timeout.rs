//! Timeout Tower Layer
//!
//! Bounds the whole request. An elapsed deadline becomes a
//! `GatewayError::RequestTimeout` response, so callers get the same JSON
//! error body as every other failure.

use std::convert::Infallible;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use tokio::time::timeout;
use tower::{Layer, Service};

use crate::error::GatewayError;

/// Timeout layer for Tower
#[derive(Debug, Clone, Copy)]
pub struct TimeoutLayer {
    duration: Duration,
}

impl TimeoutLayer {
    /// Creates a new timeout layer with the given duration
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            inner,
            duration: self.duration,
        }
    }
}

/// Timeout service wrapper
#[derive(Clone)]
pub struct TimeoutService<S> {
    inner: S,
    duration: Duration,
}

impl<S> Service<Request<Body>> for TimeoutService<S>
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
        let duration = self.duration;
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            match timeout(duration, inner.call(req)).await {
                Ok(result) => result,
                Err(_) => {
                    let timeout_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
                    tracing::warn!(timeout_ms, "Request timed out");
                    Ok(GatewayError::RequestTimeout { duration }.into_response())
                }
            }
        })
    }
}
