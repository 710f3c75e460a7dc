//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (data source has a client)
//! - GET /health - Full health status
//! - GET /api/v1/health - Data source check, as shown next to its test button

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;
use crate::datasource::CheckHealthResult;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Kubernetes readiness probe.
/// Returns 200 once a store client exists. Does not contact the store.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    match state.datasource.store() {
        Some(_) => StatusCode::OK,
        None => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// GET /health
///
/// Full health status with component details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let check = state.datasource.check_health().await;

    let (status, datasource) = if check.is_ok() {
        ("healthy", "ok")
    } else {
        ("unhealthy", "error")
    };

    Json(HealthResponse {
        status: status.to_string(),
        datasource: datasource.to_string(),
        message: check.message,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/v1/health
pub async fn check_datasource(State(state): State<Arc<AppState>>) -> Json<CheckHealthResult> {
    Json(state.datasource.check_health().await)
}
