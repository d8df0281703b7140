//! Guard Tower Layer
//!
//! Rejects requests the [`RequestGuard`] refuses and rewrites admitted ones:
//! the bearer token is removed and identity headers are injected.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use futures::future::BoxFuture;
use tower::{Layer, Service};

use crate::guard::{RequestGuard, RouteAccess};

/// Guard layer for Tower
#[derive(Clone)]
pub struct GuardLayer {
    guard: Arc<RequestGuard>,
    access: RouteAccess,
}

impl GuardLayer {
    /// Guard the wrapped routes with `access`.
    pub const fn new(guard: Arc<RequestGuard>, access: RouteAccess) -> Self {
        Self { guard, access }
    }
}

impl<S> Layer<S> for GuardLayer {
    type Service = GuardService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GuardService {
            inner,
            guard: Arc::clone(&self.guard),
            access: self.access,
        }
    }
}

/// Guard service wrapper
#[derive(Clone)]
pub struct GuardService<S> {
    inner: S,
    guard: Arc<RequestGuard>,
    access: RouteAccess,
}

impl<S> Service<Request<Body>> for GuardService<S>
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
        let decision =
            self.guard
                .authorize(req.headers(), self.access, req.uri().path(), Utc::now());

        let identity = match decision {
            Ok(identity) => identity,
            Err(err) => return Box::pin(async move { Ok(err.into_response()) }),
        };

        let headers = req.headers_mut();
        headers.remove(header::AUTHORIZATION);
        identity.apply_to(headers);
        req.extensions_mut().insert(identity);

        // The clone may not be ready; keep the one poll_ready was called on
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(req).await })
    }
}
