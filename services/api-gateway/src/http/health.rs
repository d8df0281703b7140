//! Liveness and collaborator status endpoints.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::AppState;
use super::proxy::ServiceHealth;

const SERVICE_NAME: &str = "api-gateway";

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `healthy` while the process serves
    pub status: &'static str,
    /// This service's name
    pub service: &'static str,
    /// RFC 3339, UTC
    pub timestamp: String,
}

/// Body of `GET /api/status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// The gateway's own state
    pub gateway: &'static str,
    /// One probe result per collaborator
    pub services: BTreeMap<&'static str, ServiceHealth>,
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// `GET /api/status`
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        gateway: "healthy",
        services: state.proxy.status().await,
    })
}
