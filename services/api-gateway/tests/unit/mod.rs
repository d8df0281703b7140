//! Unit Tests Module
//!
//! Organized by domain. Each submodule drives one component through its
//! public API.
//!
//! Structure:
//! - authenticator: login outcomes and failure classification
//! - token: issue / verify, expiry boundary, type-state pipeline
//! - guard: bearer extraction and role enforcement
//! - rate_limiter: fixed windows, isolation, lazy reset
//! - middleware: tower layers in isolation

pub mod authenticator;
pub mod middleware;
pub mod token;

use std::sync::Arc;

use api_gateway::credentials::{Principal, Role, StaticCredentialStore};
use api_gateway::jwt::{DEFAULT_TOKEN_TTL_SECONDS, TokenCodec};
use secrecy::SecretString;

pub const TEST_SECRET: &str = "unit-test-signing-secret-0123456789abcdef";

pub fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

pub fn codec() -> Arc<TokenCodec> {
    Arc::new(TokenCodec::new(&secret(TEST_SECRET), DEFAULT_TOKEN_TTL_SECONDS))
}

pub fn admin() -> Principal {
    Principal::new("admin", 1, Role::Admin, &secret("admin123"))
}

pub fn user() -> Principal {
    Principal::new("user", 2, Role::User, &secret("user123"))
}

pub fn store() -> Arc<StaticCredentialStore> {
    Arc::new(StaticCredentialStore::new(vec![admin(), user()]).unwrap())
}
