//! Observability: structured audit events on top of `tracing`.
//!
//! Subscriber installation lives in `rust_common::tracing_config`.

pub mod audit;
