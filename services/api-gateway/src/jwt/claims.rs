//! Token payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credentials::{Principal, Role};

/// Token payload. Field order is the serialisation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Numeric principal id
    pub user_id: u64,
    /// Principal identity
    pub username: String,
    /// Role at issuance
    pub role: Role,
    /// Issued-at, Unix seconds
    pub iat: i64,
    /// Expires-at, Unix seconds
    pub exp: i64,
}

impl Claims {
    /// Payload for `principal`, issued at `now` and valid for `ttl_seconds`.
    ///
    /// Returns `None` if the expiry does not fit in an `i64` timestamp.
    #[must_use]
    pub fn for_principal(principal: &Principal, now: DateTime<Utc>, ttl_seconds: i64) -> Option<Self> {
        let iat = now.timestamp();
        Some(Self {
            user_id: principal.id(),
            username: principal.identity().to_string(),
            role: principal.role(),
            iat,
            exp: iat.checked_add(ttl_seconds)?,
        })
    }

    /// Strict expiry: a token whose `exp` equals `now` is already expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// `exp` as a timestamp, if representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}
