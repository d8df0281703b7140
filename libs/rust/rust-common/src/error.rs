//! Error type for calls from a boundary service into internal collaborators.
//!
//! Outbound failures are classified once, here, so every service maps a
//! refused connection or a slow collaborator to the same outcome.

use thiserror::Error;

/// Common error type for outbound platform operations.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The collaborator could not be reached (connection refused, DNS, reset).
    #[error("{service} service unavailable")]
    Unavailable {
        /// Logical name of the collaborator
        service: String,
    },

    /// The collaborator accepted the connection but did not answer in time.
    #[error("{service} service timed out")]
    Timeout {
        /// Logical name of the collaborator
        service: String,
    },

    /// Any other transport or protocol failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl PlatformError {
    /// Classify a transport error raised while calling `service`.
    #[must_use]
    pub fn from_upstream(service: impl Into<String>, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                service: service.into(),
            }
        } else if err.is_connect() {
            Self::Unavailable {
                service: service.into(),
            }
        } else {
            Self::Http(err)
        }
    }

    /// Check if this error is transient.
    ///
    /// The boundary never retries on its own; this only informs callers and logs.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_common::PlatformError;
    ///
    /// let err = PlatformError::Unavailable { service: "assets".to_string() };
    /// assert!(err.is_retryable());
    ///
    /// let err = PlatformError::Timeout { service: "files".to_string() };
    /// assert!(err.is_retryable());
    /// ```
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Timeout { .. })
    }
}
