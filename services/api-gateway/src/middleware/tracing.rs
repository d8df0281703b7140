//! Tracing Tower Layer
//!
//! Opens a span per request carrying a correlation id, propagates the id as
//! `X-Request-ID` in both directions and logs completion with latency.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::response::Response;
use futures::future::BoxFuture;
use tower::{Layer, Service};
use tracing::{Instrument, info_span};
use uuid::Uuid;

/// `X-Request-ID`
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const MAX_REQUEST_ID_LEN: usize = 128;

/// Tracing layer for Tower
#[derive(Clone)]
pub struct TracingLayer {
    service_name: Arc<str>,
}

impl TracingLayer {
    /// Creates a new tracing layer
    pub fn new(service_name: impl Into<Arc<str>>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService {
            inner,
            service_name: Arc::clone(&self.service_name),
        }
    }
}

/// Tracing service wrapper
#[derive(Clone)]
pub struct TracingService<S> {
    inner: S,
    service_name: Arc<str>,
}

/// Reuse a caller-supplied id if it is short printable ASCII, else mint one.
pub fn correlation_id<B>(req: &Request<B>) -> String {
    req.headers()
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_REQUEST_ID_LEN
                && id.bytes().all(|b| b.is_ascii_graphic())
        })
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_string)
}

impl<S> Service<Request<Body>> for TracingService<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let correlation_id = correlation_id(&req);
        let header_value = HeaderValue::from_str(&correlation_id).ok();
        if let Some(value) = &header_value {
            req.headers_mut().insert(X_REQUEST_ID, value.clone());
        }

        let span = info_span!(
            "request",
            service = %self.service_name,
            correlation_id = %correlation_id,
            method = %req.method(),
            path = %req.uri().path(),
        );

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let started = Instant::now();

        Box::pin(
            async move {
                let mut response = inner.call(req).await?;
                let status = response.status().as_u16();
                let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

                if response.status().is_server_error() {
                    tracing::error!(status, latency_ms, "Request failed");
                } else {
                    tracing::info!(status, latency_ms, "Request completed");
                }

                if let Some(value) = header_value {
                    response.headers_mut().insert(X_REQUEST_ID, value);
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}
