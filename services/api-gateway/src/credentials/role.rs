//! Roles and the rule deciding which satisfies which.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of roles a principal can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Elevated role; satisfies every role requirement
    Admin,
    /// Regular user
    User,
}

impl Role {
    /// Wire name, as carried in tokens and the `X-User-Role` header.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    /// Whether a holder of `self` may access a route requiring `required`.
    ///
    /// `admin` satisfies any requirement; every other role must match exactly.
    #[must_use]
    pub fn satisfies(self, required: Self) -> bool {
        self == Self::Admin || self == required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}
