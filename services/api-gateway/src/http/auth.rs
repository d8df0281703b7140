//! Authentication endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::response::IntoResponse;
use axum::{Json, http::StatusCode};
use chrono::Utc;
use serde::Serialize;

use crate::authenticator::{LoginRequest, PrincipalView};
use crate::error::GatewayError;
use crate::identity::VerifiedIdentity;

use super::AppState;

/// Body of a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Fixed success message
    pub message: &'static str,
    /// Signed bearer token
    pub token: String,
    /// Who logged in
    pub user: PrincipalView,
}

/// Body of `POST /auth/verify`.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    /// Fixed success message
    pub message: &'static str,
    /// Claims of the presented token
    pub user: VerifiedIdentity,
}

/// Body of `GET /auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// Claims of the presented token
    pub user: VerifiedIdentity,
}

/// `POST /auth/login`
///
/// A body that is absent or not a JSON object counts as missing credentials;
/// one over the body cap is rejected as too large.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(JsonRejection::BytesRejection(rejection))
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE =>
        {
            return Err(GatewayError::PayloadTooLarge);
        }
        Err(_) => LoginRequest::default(),
    };
    let outcome = state.authenticator.login_request(&request, Utc::now())?;

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            message: "Login successful",
            token: outcome.token,
            user: outcome.user,
        }),
    ))
}

/// `POST /auth/verify`
pub async fn verify(Extension(identity): Extension<VerifiedIdentity>) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        message: "Token is valid",
        user: identity,
    })
}

/// `GET /auth/me`
pub async fn me(Extension(identity): Extension<VerifiedIdentity>) -> Json<MeResponse> {
    Json(MeResponse { user: identity })
}
