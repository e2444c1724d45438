//! Health check endpoint.

use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::config;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /api/health`: unauthenticated liveness probe.
pub async fn check() -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "ok",
        version: config::APP_VERSION,
    }))
}
