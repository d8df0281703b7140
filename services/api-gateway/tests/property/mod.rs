//! Property-Based Tests Module
//!
//! Uses proptest for invariant verification.
//! Each test runs minimum 100 iterations.
//!
//! Test categories:
//! - token_tampering: any altered token is rejected
//! - authorization_header: arbitrary header values never pass the guard
//! - token_roundtrip: issued identity survives verification
//! - credentials: secret comparison is exact
//! - rate_limiter: admissions never exceed the limit
//! - error_sanitization: sensitive data never leaks

pub mod authorization_header;
pub mod credentials;
pub mod error_sanitization;
pub mod generators;
pub mod rate_limiter;
pub mod token_tampering;
