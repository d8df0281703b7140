//! Outbound HTTP client configuration and header hygiene.
//!
//! Boundary services talk to internal collaborators through one pooled
//! client built here, and strip connection-scoped headers before relaying.

use reqwest::header::HeaderName;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Headers that describe a single hop and must not be relayed by a proxy.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Whole-request timeout (default: 30s)
    pub timeout: Duration,
    /// Connection timeout (default: 5s)
    pub connect_timeout: Duration,
    /// Pool idle timeout (default: 90s)
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host (default: 16)
    pub pool_max_idle_per_host: usize,
    /// User agent sent to collaborators
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 16,
            user_agent: "API-Gateway".to_string(),
        }
    }
}

impl HttpConfig {
    /// Set the whole-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Build a pooled HTTP client for talking to internal collaborators.
///
/// Redirects are not followed: a collaborator's redirect is relayed to the
/// caller as-is.
///
/// # Errors
///
/// Returns an error if the client cannot be built (e.g., TLS initialization fails).
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .user_agent(&config.user_agent)
        .redirect(reqwest::redirect::Policy::none())
        .use_rustls_tls()
        .build()
}

/// Whether `name` is a hop-by-hop header that a proxy must drop.
#[must_use]
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}
