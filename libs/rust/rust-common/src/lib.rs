//! Shared library for cross-cutting concerns in media-platform Rust services.
//!
//! This crate provides centralized implementations for:
//! - Error types for calls into internal collaborators
//! - Outbound HTTP client configuration and header hygiene
//! - Tracing subscriber initialisation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod tracing_config;

pub use error::PlatformError;
pub use http::{HttpConfig, build_http_client, is_hop_by_hop};
pub use tracing_config::{LogFormat, TracingConfig, init_tracing};
