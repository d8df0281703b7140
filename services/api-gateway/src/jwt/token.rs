//! Type-state token with compile-time validation guarantees.
//!
//! Claims can only be read from a `Token<Validated>`, which exists only after
//! the signature has verified and the expiry check has passed.

use std::fmt;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation, decode, decode_header};

use crate::identity::VerifiedIdentity;
use crate::jwt::claims::Claims;
use crate::jwt::error::TokenError;

mod private {
    pub trait Sealed {}
}

/// Marker trait for token validation states.
pub trait TokenState: private::Sealed {
    /// Human-readable state name for debugging.
    fn state_name() -> &'static str;
}

/// Just parsed; nothing verified.
pub struct Unvalidated {
    raw: String,
}

impl fmt::Debug for Unvalidated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unvalidated")
            .field("len", &self.raw.len())
            .finish_non_exhaustive()
    }
}

impl private::Sealed for Unvalidated {}
impl TokenState for Unvalidated {
    fn state_name() -> &'static str {
        "Unvalidated"
    }
}

/// Signature verified; expiry not yet checked.
#[derive(Debug)]
pub struct SignatureValidated {
    claims: Claims,
}

impl private::Sealed for SignatureValidated {}
impl TokenState for SignatureValidated {
    fn state_name() -> &'static str {
        "SignatureValidated"
    }
}

/// Signature and expiry verified.
#[derive(Debug)]
pub struct Validated {
    claims: Claims,
}

impl private::Sealed for Validated {}
impl TokenState for Validated {
    fn state_name() -> &'static str {
        "Validated"
    }
}

/// Bearer token moving through the validation pipeline.
#[derive(Debug)]
pub struct Token<S: TokenState> {
    header: Header,
    state: S,
}

impl Token<Unvalidated> {
    /// Parse the compact form and check the header names `expected`.
    ///
    /// # Errors
    ///
    /// `TokenError::Malformed` for anything that is not a three-segment token
    /// with a decodable header using the expected algorithm.
    pub fn parse(raw: &str, expected: Algorithm) -> Result<Self, TokenError> {
        if raw.split('.').count() != 3 {
            return Err(TokenError::malformed("expected three segments"));
        }

        let header = decode_header(raw)
            .map_err(|e| TokenError::malformed(format!("invalid header: {}", TokenError::from(e))))?;

        if header.alg != expected {
            return Err(TokenError::malformed("unexpected signing algorithm"));
        }

        Ok(Self {
            header,
            state: Unvalidated {
                raw: raw.to_string(),
            },
        })
    }

    /// Algorithm named in the header.
    pub const fn algorithm(&self) -> Algorithm {
        self.header.alg
    }

    /// Verify the signature and decode the claims.
    ///
    /// `validation` must have expiry checking disabled; expiry is evaluated
    /// by [`Token::<SignatureValidated>::validate_expiry`] against an explicit clock.
    ///
    /// # Errors
    ///
    /// `TokenError::BadSignature` when the signature does not verify,
    /// `TokenError::Malformed` when the payload is not a valid claims object.
    pub fn verify_signature(
        self,
        key: &DecodingKey,
        validation: &Validation,
    ) -> Result<Token<SignatureValidated>, TokenError> {
        let data = decode::<Claims>(&self.state.raw, key, validation)?;

        Ok(Token {
            header: self.header,
            state: SignatureValidated {
                claims: data.claims,
            },
        })
    }
}

impl Token<SignatureValidated> {
    /// Check expiry at `now` and transition to fully validated.
    ///
    /// # Errors
    ///
    /// `TokenError::Expired` when `now >= exp`.
    pub fn validate_expiry(self, now: DateTime<Utc>) -> Result<Token<Validated>, TokenError> {
        if self.state.claims.is_expired_at(now) {
            return Err(TokenError::Expired {
                expired_at: self.state.claims.exp,
            });
        }

        Ok(Token {
            header: self.header,
            state: Validated {
                claims: self.state.claims,
            },
        })
    }

    /// Read-only view of claims whose expiry has not been checked.
    pub const fn peek_claims(&self) -> &Claims {
        &self.state.claims
    }
}

impl Token<Validated> {
    /// Claims of a fully validated token.
    pub const fn claims(&self) -> &Claims {
        &self.state.claims
    }

    /// Token header.
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// Identity asserted by this token.
    #[must_use]
    pub fn into_identity(self) -> VerifiedIdentity {
        VerifiedIdentity::from(self.state.claims)
    }
}

impl<S: TokenState> Token<S> {
    /// Current state name.
    pub fn state_name(&self) -> &'static str {
        S::state_name()
    }
}
