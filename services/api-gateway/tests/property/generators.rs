//! Proptest Generators
//!
//! Shared generators for property-based tests.

use api_gateway::credentials::{Principal, Role};
use proptest::prelude::*;
use secrecy::SecretString;

/// Characters of the base64url alphabet used by compact tokens
pub const BASE64URL: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Generates either role
pub fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Admin), Just(Role::User)]
}

/// Generates plausible usernames (legal header values)
pub fn arb_username() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.-]{0,30}"
}

/// Generates non-empty secrets
pub fn arb_secret() -> impl Strategy<Value = String> {
    "[ -~]{1,64}"
}

/// Generates principals
pub fn arb_principal() -> impl Strategy<Value = Principal> {
    (arb_username(), 1u64..1_000_000, arb_role(), arb_secret()).prop_map(
        |(username, id, role, secret)| {
            Principal::new(username, id, role, &SecretString::from(secret))
        },
    )
}

/// Generates sensitive content patterns
pub fn arb_sensitive_content() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("password=secret123".to_string()),
        Just("Bearer eyJhbGciOiJIUzI1NiJ9".to_string()),
        Just("JWT_SECRET_KEY=0123456789abcdef".to_string()),
        Just("credential: admin:admin123".to_string()),
        "[a-zA-Z0-9_]{5,20}".prop_map(|s| format!("password={s}")),
    ]
}

/// Generates caller keys (IPv4 addresses)
pub fn arb_caller_key() -> impl Strategy<Value = String> {
    (any::<u8>(), any::<u8>(), any::<u8>(), any::<u8>())
        .prop_map(|(a, b, c, d)| format!("{a}.{b}.{c}.{d}"))
}
