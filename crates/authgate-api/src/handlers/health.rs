//! Health check handler

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Seconds since the server started
    pub uptime: u64,
    pub message: String,
    pub date: DateTime<Utc>,
}

/// Liveness probe
///
/// Also pings the credential store; an unreachable store turns the answer
/// into a 503 carrying the failure in `message`.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Credential store unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut response = HealthResponse {
        uptime: state.uptime_secs(),
        message: "Ok".to_string(),
        date: Utc::now(),
    };

    match state.auth.store().ping().await {
        Ok(()) => (StatusCode::OK, Json(response)),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            response.message = e.to_string();
            (StatusCode::SERVICE_UNAVAILABLE, Json(response))
        }
    }
}
