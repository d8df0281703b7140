//! Token codec failures.

use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use thiserror::Error;

/// Why a token could not be issued or accepted.
///
/// The distinction is for diagnostics only; at the boundary every variant
/// collapses into one generic authentication failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Not a well-formed token for this codec (structure, encoding, claims, algorithm)
    #[error("token malformed: {reason}")]
    Malformed {
        /// Internal description, never sent to callers
        reason: String,
    },

    /// Signature does not verify under the shared secret
    #[error("token signature invalid")]
    BadSignature,

    /// Signature verified but the token is at or past its expiry
    #[error("token expired at {expired_at}")]
    Expired {
        /// Unix timestamp from the `exp` claim
        expired_at: i64,
    },

    /// Token could not be produced
    #[error("token encoding failed: {reason}")]
    Encoding {
        /// Internal description
        reason: String,
    },
}

impl TokenError {
    /// Short machine-readable reason, used for audit logging.
    #[must_use]
    pub const fn reason_code(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "malformed",
            Self::BadSignature => "bad_signature",
            Self::Expired { .. } => "expired",
            Self::Encoding { .. } => "encoding",
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

impl From<JwtError> for TokenError {
    fn from(err: JwtError) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => Self::BadSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::malformed("unexpected signing algorithm")
            }
            ErrorKind::MissingRequiredClaim(claim) => {
                Self::malformed(format!("missing claim '{claim}'"))
            }
            ErrorKind::Base64(_) => Self::malformed("invalid base64 segment"),
            ErrorKind::Json(_) => Self::malformed("invalid claims payload"),
            ErrorKind::Utf8(_) => Self::malformed("invalid utf-8 in token"),
            _ => Self::malformed("token validation failed"),
        }
    }
}
