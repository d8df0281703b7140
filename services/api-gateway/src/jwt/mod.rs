//! Token codec: issues and verifies signed, time-bounded identity tokens.

pub mod claims;
pub mod codec;
pub mod error;
pub mod token;

pub use claims::Claims;
pub use codec::{DEFAULT_TOKEN_TTL_SECONDS, IssuedToken, TokenCodec};
pub use error::TokenError;
pub use token::{SignatureValidated, Token, TokenState, Unvalidated, Validated};
