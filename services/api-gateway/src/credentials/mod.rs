//! Credential store: the fixed set of principals the gateway recognises.

pub mod role;
pub mod store;

pub use role::Role;
pub use store::{CredentialStore, CredentialStoreError, Principal, StaticCredentialStore};
