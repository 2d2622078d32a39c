//! Liveness, readiness and metrics endpoints.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::services::get_metrics;
use crate::startup::AppState;

/// Health check endpoint for Docker/K8s liveness probes.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.health.ping().await {
        Ok(_) => {
            tracing::debug!("Health check passed");
            (
                StatusCode::OK,
                Json(json!({
                    "status": "ok",
                    "service": "invoicing-service",
                    "version": env!("CARGO_PKG_VERSION")
                })),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed - store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": "invoicing-service"
                })),
            )
        }
    }
}

/// Readiness check endpoint for K8s readiness probes.
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    match state.health.ping().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Metrics endpoint for Prometheus scraping.
pub async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
