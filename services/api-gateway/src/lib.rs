//! API Gateway - authentication boundary for the media services.
//!
//! This crate authenticates principals, issues and verifies signed bearer
//! tokens, enforces roles and per-caller rate limits, and forwards admitted
//! requests to internal collaborators with the verified identity attached.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod authenticator;
pub mod config;
pub mod credentials;
pub mod error;
pub mod guard;
pub mod http;
pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod observability;
pub mod rate_limiter;
pub mod shutdown;

pub use authenticator::{Authenticator, LoginOutcome, LoginRequest};
pub use config::Config;
pub use error::{ErrorCode, ErrorResponse, GatewayError};
pub use http::{AppState, build_router};
pub use identity::VerifiedIdentity;
