//! Verified identity and its propagation to internal collaborators.
//!
//! Collaborators behind the gateway learn who the caller is only through the
//! three headers below. They trust them because they cannot be reached except
//! through this boundary, so the gateway must strip any client-supplied copy
//! before injecting its own.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use crate::credentials::Role;
use crate::jwt::Claims;

/// Numeric principal id forwarded to collaborators.
pub const X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");
/// Identity (username) forwarded to collaborators.
pub const X_USERNAME: HeaderName = HeaderName::from_static("x-username");
/// Role forwarded to collaborators.
pub const X_USER_ROLE: HeaderName = HeaderName::from_static("x-user-role");

/// Identity asserted by a valid token, scoped to a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedIdentity {
    /// Numeric principal id
    pub user_id: u64,
    /// Login identity
    pub username: String,
    /// Role asserted by the token
    pub role: Role,
    /// Issued-at, Unix seconds
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Expires-at, Unix seconds
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl From<Claims> for VerifiedIdentity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
            role: claims.role,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

impl VerifiedIdentity {
    /// Replace any identity headers in `headers` with this identity.
    ///
    /// A username that is not a legal header value is never produced by the
    /// credential store; if one appears the header is left out rather than
    /// forwarded corrupted.
    pub fn apply_to(&self, headers: &mut HeaderMap) {
        strip_identity_headers(headers);

        headers.insert(X_USER_ID, HeaderValue::from(self.user_id));
        if let Ok(value) = HeaderValue::from_str(&self.username) {
            headers.insert(X_USERNAME, value);
        }
        headers.insert(X_USER_ROLE, HeaderValue::from_static(self.role.as_str()));
    }
}

/// Remove every identity header, whatever its case or multiplicity.
pub fn strip_identity_headers(headers: &mut HeaderMap) {
    headers.remove(X_USER_ID);
    headers.remove(X_USERNAME);
    headers.remove(X_USER_ROLE);
}
