//! Reverse proxy to the internal collaborators.
//!
//! The proxy sees requests only after the guard has replaced the bearer token
//! with identity headers. It relays method, query, body and end-to-end headers
//! and never forwards credentials.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::Response;
use futures::future::join_all;
use reqwest::Client;
use rust_common::{PlatformError, is_hop_by_hop};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::ServiceUrls;
use crate::error::GatewayError;
use crate::rate_limiter::LimitedRoute;

/// Internal collaborator behind the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Upstream {
    /// Asset metadata
    Assets,
    /// Object storage
    Files,
    /// Media transcoding jobs
    Transcode,
    /// Search index
    Search,
}

impl Upstream {
    /// Every collaborator, in status-report order.
    pub const ALL: [Self; 4] = [Self::Assets, Self::Files, Self::Transcode, Self::Search];

    /// Service name, also its path segment under `/api`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Assets => "assets",
            Self::Files => "files",
            Self::Transcode => "transcode",
            Self::Search => "search",
        }
    }

    /// Throttling bucket for this collaborator's routes.
    pub const fn limited_route(self) -> LimitedRoute {
        match self {
            Self::Assets => LimitedRoute::Assets,
            Self::Files => LimitedRoute::Files,
            Self::Transcode => LimitedRoute::Transcode,
            Self::Search => LimitedRoute::Search,
        }
    }

    /// Gateway path prefix, e.g. `/api/assets`.
    pub fn prefix(self) -> String {
        format!("/api/{}", self.name())
    }
}

/// Outcome of a collaborator health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Answered `200`
    Healthy,
    /// Answered with any other status
    Unhealthy,
    /// Did not answer
    Unavailable,
}

/// One entry of the aggregated status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceHealth {
    /// Probe outcome
    pub status: HealthStatus,
    /// Round trip of an answered probe
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    /// Transport error of an unanswered probe
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Request headers that never reach a collaborator, besides hop-by-hop ones.
fn is_stripped_request_header(name: &header::HeaderName) -> bool {
    name == header::AUTHORIZATION
        || name == header::HOST
        || name == header::CONTENT_LENGTH
        || name == header::USER_AGENT
        || is_hop_by_hop(name)
}

/// Forwards requests to collaborators over a shared pooled client.
#[derive(Debug, Clone)]
pub struct UpstreamProxy {
    client: Client,
    services: ServiceUrls,
    health_timeout: Duration,
}

impl UpstreamProxy {
    /// Proxy over `client`; probes are bounded by `health_timeout`.
    pub const fn new(client: Client, services: ServiceUrls, health_timeout: Duration) -> Self {
        Self {
            client,
            services,
            health_timeout,
        }
    }

    /// Collaborator URL for a gateway request URI.
    ///
    /// `/api/assets/x/y?q=1` maps to `<assets url>/api/assets/x/y?q=1`. The
    /// path suffix is copied verbatim, so percent-encoding survives.
    ///
    /// # Errors
    ///
    /// `NotFound` if `uri` is outside the upstream's prefix.
    pub fn target_url(&self, upstream: Upstream, uri: &Uri) -> Result<Url, GatewayError> {
        let prefix = upstream.prefix();
        let suffix = uri
            .path()
            .strip_prefix(prefix.as_str())
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .ok_or(GatewayError::NotFound)?;
        let suffix = if suffix == "/" { "" } else { suffix };

        let base = self.services.get(upstream).as_str().trim_end_matches('/');
        let mut target = format!("{base}{prefix}{suffix}");
        if let Some(query) = uri.query() {
            target.push('?');
            target.push_str(query);
        }

        Url::parse(&target).map_err(|e| GatewayError::Internal(anyhow::Error::new(e)))
    }

    /// Relay one request and its response.
    ///
    /// # Errors
    ///
    /// `ServiceUnavailable` when the collaborator cannot be reached,
    /// `UpstreamTimeout` when it is too slow, `Internal` otherwise.
    pub async fn forward(
        &self,
        upstream: Upstream,
        method: Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<Response, GatewayError> {
        let target = self.target_url(upstream, uri)?;

        let mut forwarded = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            if !is_stripped_request_header(name) {
                forwarded.append(name.clone(), value.clone());
            }
        }

        debug!(service = upstream.name(), %method, target = %target, "Proxying request");

        let upstream_response = self
            .client
            .request(method, target)
            .headers(forwarded)
            .body(body)
            .send()
            .await
            .map_err(|e| upstream_error(upstream, e))?;

        let status = upstream_response.status();
        let mut relayed = HeaderMap::with_capacity(upstream_response.headers().len());
        for (name, value) in upstream_response.headers() {
            if !is_hop_by_hop(name) && name != header::CONTENT_LENGTH {
                relayed.append(name.clone(), value.clone());
            }
        }

        let bytes = upstream_response
            .bytes()
            .await
            .map_err(|e| upstream_error(upstream, e))?;

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = relayed;
        Ok(response)
    }

    /// Probe `GET <url>/health` on one collaborator.
    pub async fn probe(&self, upstream: Upstream) -> ServiceHealth {
        let base = self.services.get(upstream).as_str().trim_end_matches('/');
        let started = Instant::now();

        let result = self
            .client
            .get(format!("{base}/health"))
            .timeout(self.health_timeout)
            .send()
            .await;

        match result {
            Ok(response) => ServiceHealth {
                status: if response.status() == StatusCode::OK {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Unhealthy
                },
                response_time_ms: Some(
                    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                ),
                error: None,
            },
            Err(e) => {
                let err = PlatformError::from_upstream(upstream.name(), e);
                warn!(service = upstream.name(), error = %err, "Health probe failed");
                ServiceHealth {
                    status: HealthStatus::Unavailable,
                    response_time_ms: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    /// Probe every collaborator concurrently.
    pub async fn status(&self) -> BTreeMap<&'static str, ServiceHealth> {
        let probes = Upstream::ALL.map(|upstream| async move {
            (upstream.name(), self.probe(upstream).await)
        });
        join_all(probes).await.into_iter().collect()
    }
}

fn upstream_error(upstream: Upstream, err: reqwest::Error) -> GatewayError {
    let err = PlatformError::from_upstream(upstream.name(), err);
    warn!(
        service = upstream.name(),
        retryable = err.is_retryable(),
        error = %err,
        "Upstream call failed"
    );
    GatewayError::from(err)
}
