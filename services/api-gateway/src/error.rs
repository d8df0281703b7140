//! Boundary error taxonomy.
//!
//! Every failure a caller can observe maps to one `GatewayError` variant, a
//! stable `ErrorCode`, an HTTP status and the body
//! `{"error": <short kind>, "message": <human text>}`. Token failures of every
//! kind collapse into `AuthFailed`, and unknown-identity and wrong-secret
//! logins share `InvalidCredentials`, so responses never reveal which check
//! failed.

use std::time::Duration;

use axum::Json;
use axum::extract::rejection::BytesRejection;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use rust_common::PlatformError;
use serde::Serialize;
use thiserror::Error;

use crate::credentials::Role;
use crate::jwt::TokenError;

/// Errors surfaced at the gateway boundary.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Login without a username or password
    #[error("missing credentials")]
    MissingCredentials,

    /// Unknown identity or wrong secret
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Protected route called without a bearer token
    #[error("authentication required")]
    AuthRequired,

    /// Token malformed, badly signed or expired
    #[error("authentication failed")]
    AuthFailed,

    /// Verified identity lacks the route's role
    #[error("role {required} required")]
    InsufficientPermissions {
        /// Role the route declares
        required: Role,
    },

    /// Caller exceeded the route's rate limit
    #[error("rate limit exceeded")]
    RateLimited {
        /// When the caller may retry
        retry_after: Duration,
    },

    /// No such route
    #[error("endpoint not found")]
    NotFound,

    /// Route exists but not for this method
    #[error("method not allowed")]
    MethodNotAllowed,

    /// Body larger than the configured cap
    #[error("request body too large")]
    PayloadTooLarge,

    /// Body could not be read
    #[error("request body could not be read")]
    InvalidBody,

    /// Whole request exceeded the gateway deadline
    #[error("request timed out after {duration:?}")]
    RequestTimeout {
        /// Deadline that elapsed
        duration: Duration,
    },

    /// Internal collaborator unreachable
    #[error("{service} service unavailable")]
    ServiceUnavailable {
        /// Collaborator name
        service: String,
    },

    /// Internal collaborator too slow
    #[error("{service} service timed out")]
    UpstreamTimeout {
        /// Collaborator name
        service: String,
    },

    /// Anything else; details are logged, never returned
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Stable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// 400, login
    MissingCredentials,
    /// 401, login
    InvalidCredentials,
    /// 401, no bearer token
    AuthRequired,
    /// 401, bad token
    AuthFailed,
    /// 403
    InsufficientPermissions,
    /// 429
    RateLimited,
    /// 404
    NotFound,
    /// 405
    MethodNotAllowed,
    /// 413
    PayloadTooLarge,
    /// 400, unreadable body
    InvalidBody,
    /// 408
    RequestTimeout,
    /// 503
    ServiceUnavailable,
    /// 504
    UpstreamTimeout,
    /// 500
    Internal,
}

impl ErrorCode {
    /// Short kind, used as the `error` field of response bodies.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "Missing credentials",
            Self::InvalidCredentials | Self::AuthFailed => "Authentication failed",
            Self::AuthRequired => "Authentication required",
            Self::InsufficientPermissions => "Insufficient permissions",
            Self::RateLimited => "Rate limit exceeded",
            Self::NotFound => "Not found",
            Self::MethodNotAllowed => "Method not allowed",
            Self::PayloadTooLarge => "Payload too large",
            Self::InvalidBody => "Bad request",
            Self::RequestTimeout => "Request timeout",
            Self::ServiceUnavailable => "Service unavailable",
            Self::UpstreamTimeout => "Gateway timeout",
            Self::Internal => "Internal server error",
        }
    }

    /// HTTP status for this code.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredentials => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::AuthRequired | Self::AuthFailed => {
                StatusCode::UNAUTHORIZED
            }
            Self::InsufficientPermissions => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidBody => StatusCode::BAD_REQUEST,
            Self::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Response body for every error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// Short kind
    pub error: &'static str,
    /// Human-readable message
    pub message: String,
}

impl GatewayError {
    /// Error code for this error.
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingCredentials => ErrorCode::MissingCredentials,
            Self::InvalidCredentials => ErrorCode::InvalidCredentials,
            Self::AuthRequired => ErrorCode::AuthRequired,
            Self::AuthFailed => ErrorCode::AuthFailed,
            Self::InsufficientPermissions { .. } => ErrorCode::InsufficientPermissions,
            Self::RateLimited { .. } => ErrorCode::RateLimited,
            Self::NotFound => ErrorCode::NotFound,
            Self::MethodNotAllowed => ErrorCode::MethodNotAllowed,
            Self::PayloadTooLarge => ErrorCode::PayloadTooLarge,
            Self::InvalidBody => ErrorCode::InvalidBody,
            Self::RequestTimeout { .. } => ErrorCode::RequestTimeout,
            Self::ServiceUnavailable { .. } => ErrorCode::ServiceUnavailable,
            Self::UpstreamTimeout { .. } => ErrorCode::UpstreamTimeout,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Caller-facing body.
    pub fn to_response_body(&self) -> ErrorResponse {
        let message = match self {
            Self::MissingCredentials => "Username and password are required".to_string(),
            Self::InvalidCredentials => "Invalid username or password".to_string(),
            Self::AuthRequired => "No token provided".to_string(),
            Self::AuthFailed => "Invalid or expired token".to_string(),
            Self::InsufficientPermissions { required } => format!("Role {required} required"),
            Self::RateLimited { .. } => "Too many requests, try again later".to_string(),
            Self::NotFound => "Endpoint not found".to_string(),
            Self::MethodNotAllowed => "Method not allowed for this endpoint".to_string(),
            Self::PayloadTooLarge => "Request body exceeds the size limit".to_string(),
            Self::InvalidBody => "Request body could not be read".to_string(),
            Self::RequestTimeout { .. } => "Request did not complete in time".to_string(),
            Self::ServiceUnavailable { service } => format!("{service} service unavailable"),
            Self::UpstreamTimeout { service } => format!("{service} service did not respond in time"),
            // Never expose internal error details
            Self::Internal(_) => "An internal error occurred".to_string(),
        };

        ErrorResponse {
            error: self.code().as_str(),
            message,
        }
    }

    /// Retry hint for throttling errors.
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let code = self.code();
        if let Self::Internal(ref err) = self {
            tracing::error!(error = %err, "internal error");
        }

        let mut response = (code.status(), Json(self.to_response_body())).into_response();

        if let Some(retry_after) = self.retry_after() {
            let secs = retry_after.as_secs().max(1);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }

        response
    }
}

impl From<BytesRejection> for GatewayError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::InvalidBody
        }
    }
}

impl From<TokenError> for GatewayError {
    fn from(_: TokenError) -> Self {
        Self::AuthFailed
    }
}

impl From<PlatformError> for GatewayError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Unavailable { service } => Self::ServiceUnavailable { service },
            PlatformError::Timeout { service } => Self::UpstreamTimeout { service },
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}
