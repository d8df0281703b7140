//! Request guard: bearer extraction, verification and role enforcement.
//!
//! Each protected request walks a small state machine:
//!
//! ```text
//! NoToken ───────────────────────────────► Rejected(AuthRequired)
//! TokenPresent ──verify──► Verified ──role──► Admitted
//!        │                    │
//!        └─► Rejected(AuthFailed)   └─► Rejected(InsufficientPermissions)
//! ```
//!
//! Public routes are not wrapped by the guard at all.

use std::sync::Arc;

use axum::http::{HeaderMap, header};
use chrono::{DateTime, Utc};

use crate::credentials::Role;
use crate::error::GatewayError;
use crate::identity::VerifiedIdentity;
use crate::jwt::TokenCodec;
use crate::observability::audit;

/// What a protected route demands of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Any valid token
    Authenticated,
    /// A valid token whose role satisfies this one
    RequireRole(Role),
}

/// Per-request guard state.
#[derive(Debug)]
pub enum GuardState<'a> {
    /// No usable bearer token on the request
    NoToken,
    /// A bearer token string was extracted
    TokenPresent(&'a str),
    /// Token verified; role not yet checked
    Verified(VerifiedIdentity),
    /// Terminal: request may be forwarded with this identity
    Admitted(VerifiedIdentity),
    /// Terminal: request is refused
    Rejected(GatewayError),
}

impl GuardState<'_> {
    /// Whether the state machine has finished.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Admitted(_) | Self::Rejected(_))
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// A missing header, another scheme, or an empty token all count as no token.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verifies bearer tokens and enforces route roles.
#[derive(Debug, Clone)]
pub struct RequestGuard {
    codec: Arc<TokenCodec>,
}

impl RequestGuard {
    /// Guard verifying tokens with `codec`.
    pub const fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// Initial state for a request carrying `headers`.
    pub fn start(headers: &HeaderMap) -> GuardState<'_> {
        extract_bearer(headers).map_or(GuardState::NoToken, GuardState::TokenPresent)
    }

    /// Advance one transition. Terminal states are returned unchanged.
    pub fn step<'a>(
        &self,
        state: GuardState<'a>,
        access: RouteAccess,
        path: &str,
        now: DateTime<Utc>,
    ) -> GuardState<'a> {
        match state {
            GuardState::NoToken => {
                audit::token_missing(path);
                GuardState::Rejected(GatewayError::AuthRequired)
            }
            GuardState::TokenPresent(raw) => match self.codec.parse_and_verify(raw, now) {
                Ok(identity) => GuardState::Verified(identity),
                Err(err) => {
                    audit::token_rejected(&err, path);
                    GuardState::Rejected(GatewayError::from(err))
                }
            },
            GuardState::Verified(identity) => match access {
                RouteAccess::RequireRole(required) if !identity.role.satisfies(required) => {
                    audit::access_denied(&identity.username, identity.role, required, path);
                    GuardState::Rejected(GatewayError::InsufficientPermissions { required })
                }
                _ => GuardState::Admitted(identity),
            },
            terminal @ (GuardState::Admitted(_) | GuardState::Rejected(_)) => terminal,
        }
    }

    /// Run the state machine to completion.
    ///
    /// # Errors
    ///
    /// `AuthRequired`, `AuthFailed`, or `InsufficientPermissions`.
    pub fn authorize(
        &self,
        headers: &HeaderMap,
        access: RouteAccess,
        path: &str,
        now: DateTime<Utc>,
    ) -> Result<VerifiedIdentity, GatewayError> {
        let mut state = Self::start(headers);
        loop {
            state = match state {
                GuardState::Admitted(identity) => return Ok(identity),
                GuardState::Rejected(err) => return Err(err),
                pending => self.step(pending, access, path, now),
            };
        }
    }
}
