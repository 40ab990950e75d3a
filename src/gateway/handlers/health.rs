//! Health check handler

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{Json, http::StatusCode};
use chrono::Utc;

use crate::fspiop::types::iso_timestamp;
use crate::gateway::types::ApiResponse;

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Build revision (short git hash)
    pub revision: &'static str,
    pub server_time: String,
    pub timestamp_ms: u64,
}

/// GET /health
///
/// The simulator has no dependencies of its own to check; answering at all
/// means it is up.
pub async fn health_check() -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    (
        StatusCode::OK,
        Json(ApiResponse::success(HealthResponse {
            status: "OK",
            revision: env!("GIT_HASH"),
            server_time: iso_timestamp(Utc::now()),
            timestamp_ms,
        })),
    )
}
