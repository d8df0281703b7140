//! Credential verification and token issuance for `POST /auth/login`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::credentials::{CredentialStore, Principal, Role};
use crate::error::GatewayError;
use crate::jwt::TokenCodec;
use crate::observability::audit::{self, LoginFailure};

/// Login request body. Both fields are optional so absence can be reported
/// as `MissingCredentials` rather than a deserialisation failure.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    /// Submitted identity
    pub username: Option<String>,
    /// Submitted secret
    pub password: Option<String>,
}

/// Public fields of a principal, returned to clients for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrincipalView {
    /// Numeric principal id
    pub user_id: u64,
    /// Login identity
    pub username: String,
    /// Role held
    pub role: Role,
}

impl From<&Principal> for PrincipalView {
    fn from(principal: &Principal) -> Self {
        Self {
            user_id: principal.id(),
            username: principal.identity().to_string(),
            role: principal.role(),
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Signed bearer token
    pub token: String,
    /// Who logged in
    pub user: PrincipalView,
    /// Unix seconds
    pub expires_at: i64,
}

/// Verifies identity/secret pairs and mints tokens. Stateless across logins.
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    codec: Arc<TokenCodec>,
    // Compared against when the identity is unknown so both failure paths do
    // the same amount of work.
    decoy: Principal,
}

impl Authenticator {
    /// Authenticator over `store`, minting tokens with `codec`.
    pub fn new(store: Arc<dyn CredentialStore>, codec: Arc<TokenCodec>) -> Self {
        let decoy = Principal::new(
            "",
            0,
            Role::User,
            &SecretString::from(uuid::Uuid::new_v4().to_string()),
        );
        Self { store, codec, decoy }
    }

    /// Authenticate `identity`/`secret` and issue a token at `now`.
    ///
    /// # Errors
    ///
    /// `MissingCredentials` when either field is absent or empty (checked
    /// before any lookup); `InvalidCredentials` for an unknown identity or a
    /// wrong secret, indistinguishably; `Internal` if signing fails.
    pub fn login(
        &self,
        identity: Option<&str>,
        secret: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, GatewayError> {
        let (Some(identity), Some(secret)) = (
            identity.filter(|s| !s.is_empty()),
            secret.filter(|s| !s.is_empty()),
        ) else {
            audit::login_rejected(LoginFailure::MissingCredentials);
            return Err(GatewayError::MissingCredentials);
        };

        let principal = match self.store.lookup(identity) {
            Ok(principal) if principal.secret_matches(secret) => principal,
            Ok(principal) => {
                audit::login_rejected(LoginFailure::WrongSecret {
                    username: principal.identity(),
                });
                return Err(GatewayError::InvalidCredentials);
            }
            Err(_) => {
                let _ = self.decoy.secret_matches(secret);
                audit::login_rejected(LoginFailure::UnknownIdentity);
                return Err(GatewayError::InvalidCredentials);
            }
        };

        let issued = self
            .codec
            .issue(&principal, now)
            .map_err(|e| GatewayError::Internal(anyhow::Error::new(e).context("token issuance failed")))?;

        audit::login_succeeded(principal.identity(), principal.id(), principal.role());

        Ok(LoginOutcome {
            token: issued.token,
            user: PrincipalView::from(&principal),
            expires_at: issued.claims.exp,
        })
    }

    /// Convenience wrapper taking the deserialised request body.
    ///
    /// # Errors
    ///
    /// As [`Authenticator::login`].
    pub fn login_request(&self, request: &LoginRequest, now: DateTime<Utc>) -> Result<LoginOutcome, GatewayError> {
        self.login(request.username.as_deref(), request.password.as_deref(), now)
    }
}
