//! Structured security events.
//!
//! Every event goes to the `audit` target with an `event_type` field. Secrets
//! and raw tokens never appear here; the specific reason a token was refused
//! does, because it is withheld from the caller.

use std::time::Duration;

use tracing::{info, warn};

use crate::credentials::Role;
use crate::jwt::TokenError;
use crate::rate_limiter::LimitedRoute;

const TARGET: &str = "audit";

/// Why a login was refused, with only what is safe to record.
///
/// An unknown identity carries nothing: the submitted text may be a
/// mistyped password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure<'a> {
    /// Username or password absent
    MissingCredentials,
    /// Known principal, wrong password
    WrongSecret {
        /// Configured identity that was matched
        username: &'a str,
    },
    /// No principal with the submitted identity
    UnknownIdentity,
}

impl LoginFailure<'_> {
    /// Reason code recorded in the event.
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing_credentials",
            Self::WrongSecret { .. } => "wrong_secret",
            Self::UnknownIdentity => "unknown_identity",
        }
    }

    /// Username recorded in the event, if any.
    pub const fn username(&self) -> Option<&str> {
        match self {
            Self::WrongSecret { username } => Some(username),
            Self::MissingCredentials | Self::UnknownIdentity => None,
        }
    }
}

/// Successful login.
pub fn login_succeeded(username: &str, user_id: u64, role: Role) {
    info!(
        target: TARGET,
        event_type = "login_success",
        username,
        user_id,
        role = %role,
        "Login succeeded"
    );
}

/// Refused login.
pub fn login_rejected(failure: LoginFailure<'_>) {
    warn!(
        target: TARGET,
        event_type = "login_failure",
        reason = failure.reason(),
        username = failure.username().unwrap_or("-"),
        "Login rejected"
    );
}

/// Bearer token failed verification; `error` keeps the precise cause.
pub fn token_rejected(error: &TokenError, path: &str) {
    warn!(
        target: TARGET,
        event_type = "token_rejected",
        reason = error.reason_code(),
        detail = %error,
        path,
        "Bearer token rejected"
    );
}

/// Protected route reached without a token.
pub fn token_missing(path: &str) {
    info!(
        target: TARGET,
        event_type = "token_missing",
        path,
        "Protected route called without a bearer token"
    );
}

/// Verified identity lacked the route's role.
pub fn access_denied(username: &str, role: Role, required: Role, path: &str) {
    warn!(
        target: TARGET,
        event_type = "access_denied",
        username,
        role = %role,
        required = %required,
        path,
        "Insufficient role for route"
    );
}

/// Caller throttled on `route`.
pub fn rate_limited(caller: &str, route: LimitedRoute, retry_after: Duration) {
    warn!(
        target: TARGET,
        event_type = "rate_limited",
        caller,
        route = %route,
        retry_after_secs = retry_after.as_secs(),
        "Rate limit exceeded"
    );
}
