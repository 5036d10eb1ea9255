use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use super::AppState;

/// Health check endpoint
/// Returns 200 OK if the service is running
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({
        "status": "healthy",
        "service": "plan-cost-estimator",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

/// Readiness check endpoint
///
/// Artifacts are loaded before the listener binds, so a running server is
/// always ready; the body describes what was loaded.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let artifacts = state.pipeline.artifacts();
    (StatusCode::OK, Json(json!({
        "status": "ready",
        "service": "plan-cost-estimator",
        "model_kind": artifacts.model.kind(),
        "n_features": artifacts.model.n_features(),
        "schema_issues": artifacts.compatibility().issues.len(),
    })))
}
