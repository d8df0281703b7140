//! Signing and verification of identity tokens under one shared secret.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, encode};
use secrecy::{ExposeSecret, SecretString};

use crate::credentials::Principal;
use crate::identity::VerifiedIdentity;
use crate::jwt::claims::Claims;
use crate::jwt::error::TokenError;
use crate::jwt::token::{Token, Unvalidated, Validated};

/// Token lifetime when none is configured: 24 hours.
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// A freshly minted token and the payload it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Compact encoded token
    pub token: String,
    /// Signed payload
    pub claims: Claims,
}

/// Issues and verifies HS256 tokens.
///
/// Holds only read-only key material; share it behind an `Arc`.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
    ttl_seconds: i64,
}

impl TokenCodec {
    /// Build a codec from the shared signing secret.
    #[must_use]
    pub fn new(secret: &SecretString, ttl_seconds: i64) -> Self {
        let secret = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            header: Header::new(ALGORITHM),
            validation,
            ttl_seconds,
        }
    }

    /// Configured token lifetime in seconds.
    #[must_use]
    pub const fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Mint a token for `principal` issued at `now`.
    ///
    /// Deterministic: the same principal, secret and `now` always produce the
    /// same token string.
    ///
    /// # Errors
    ///
    /// `TokenError::Encoding` if the expiry overflows or signing fails.
    pub fn issue(&self, principal: &Principal, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let claims = Claims::for_principal(principal, now, self.ttl_seconds).ok_or_else(|| {
            TokenError::Encoding {
                reason: "expiry out of range".to_string(),
            }
        })?;

        let token = encode(&self.header, &claims, &self.encoding_key).map_err(|e| {
            TokenError::Encoding {
                reason: e.to_string(),
            }
        })?;

        Ok(IssuedToken { token, claims })
    }

    /// Run the full validation pipeline and return the validated token.
    ///
    /// # Errors
    ///
    /// `Malformed`, `BadSignature`, or `Expired`.
    pub fn verify(&self, raw: &str, now: DateTime<Utc>) -> Result<Token<Validated>, TokenError> {
        Token::<Unvalidated>::parse(raw, ALGORITHM)?
            .verify_signature(&self.decoding_key, &self.validation)?
            .validate_expiry(now)
    }

    /// Verify `raw` at `now` and return the identity it asserts.
    ///
    /// # Errors
    ///
    /// `Malformed`, `BadSignature`, or `Expired`.
    pub fn parse_and_verify(&self, raw: &str, now: DateTime<Utc>) -> Result<VerifiedIdentity, TokenError> {
        self.verify(raw, now).map(Token::into_identity)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}
