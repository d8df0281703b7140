//! Tower middleware for the gateway router.
//!
//! Layers are attached per route with `Router::route_layer`; the one added
//! last runs first, so rate limiting wraps the guard.

pub mod guard;
pub mod rate_limiter;
pub mod timeout;
pub mod tracing;

pub use guard::{GuardLayer, GuardService};
pub use rate_limiter::{CallerKeySource, RateLimitLayer, RateLimitService};
pub use timeout::{TimeoutLayer, TimeoutService};
pub use self::tracing::{TracingLayer, TracingService, X_REQUEST_ID};
