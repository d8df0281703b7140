//! Principals and the lookup contract the authenticator depends on.
//!
//! Secrets are reduced to a SHA-256 digest when the store is built and
//! compared in constant time, so neither the plaintext nor the comparison
//! timing is observable once startup completes.

use std::collections::HashMap;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

use super::role::Role;

/// Credential store errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialStoreError {
    /// No principal with this identity
    #[error("principal not found")]
    NotFound,

    /// Store built with no principals; fatal at startup
    #[error("credential store has no principals configured")]
    Empty,

    /// Two principals share an identity or numeric id
    #[error("duplicate principal: {0}")]
    Duplicate(String),

    /// A principal was configured with an empty identity or secret
    #[error("principal has an empty identity or secret")]
    Blank,
}

type SecretDigest = [u8; 32];

fn digest(secret: &str) -> SecretDigest {
    Sha256::digest(secret.as_bytes()).into()
}

/// A configured identity with its secret and role. Immutable once built.
#[derive(Clone)]
pub struct Principal {
    identity: String,
    id: u64,
    role: Role,
    secret_digest: SecretDigest,
}

impl Principal {
    /// Build a principal; the secret is digested immediately and not retained.
    #[must_use]
    pub fn new(identity: impl Into<String>, id: u64, role: Role, secret: &SecretString) -> Self {
        Self {
            identity: identity.into(),
            id,
            role,
            secret_digest: digest(secret.expose_secret()),
        }
    }

    /// Unique identity (the login username).
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Numeric principal id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Role held by this principal.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Constant-time check of a candidate secret.
    #[must_use]
    pub fn secret_matches(&self, candidate: &str) -> bool {
        digest(candidate)[..].ct_eq(&self.secret_digest[..]).into()
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("identity", &self.identity)
            .field("id", &self.id)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Lookup from identity to principal.
///
/// Implementations must be read-only after construction and safe to share
/// across request tasks.
pub trait CredentialStore: Send + Sync {
    /// Find the principal registered under `identity`.
    ///
    /// # Errors
    ///
    /// `CredentialStoreError::NotFound` when no such principal exists.
    fn lookup(&self, identity: &str) -> Result<Principal, CredentialStoreError>;

    /// Number of principals known to the store.
    fn len(&self) -> usize;

    /// Whether the store holds no principals.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory store loaded once from configuration.
#[derive(Debug)]
pub struct StaticCredentialStore {
    principals: HashMap<String, Principal>,
}

impl StaticCredentialStore {
    /// Build the store, rejecting empty, blank, or duplicate entries.
    ///
    /// # Errors
    ///
    /// Any `CredentialStoreError` other than `NotFound`; all are startup-fatal.
    pub fn new(principals: Vec<Principal>) -> Result<Self, CredentialStoreError> {
        if principals.is_empty() {
            return Err(CredentialStoreError::Empty);
        }

        let blank = digest("");
        let mut by_identity = HashMap::with_capacity(principals.len());
        let mut ids = Vec::with_capacity(principals.len());

        for principal in principals {
            if principal.identity.is_empty() || bool::from(principal.secret_digest[..].ct_eq(&blank[..])) {
                return Err(CredentialStoreError::Blank);
            }
            if ids.contains(&principal.id) {
                return Err(CredentialStoreError::Duplicate(format!("id {}", principal.id)));
            }
            ids.push(principal.id);

            let identity = principal.identity.clone();
            if by_identity.insert(identity.clone(), principal).is_some() {
                return Err(CredentialStoreError::Duplicate(identity));
            }
        }

        Ok(Self {
            principals: by_identity,
        })
    }
}

impl CredentialStore for StaticCredentialStore {
    fn lookup(&self, identity: &str) -> Result<Principal, CredentialStoreError> {
        self.principals
            .get(identity)
            .cloned()
            .ok_or(CredentialStoreError::NotFound)
    }

    fn len(&self) -> usize {
        self.principals.len()
    }
}
