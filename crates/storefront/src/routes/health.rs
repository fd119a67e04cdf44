//! Liveness and readiness probes.

use axum::{extract::State, http::StatusCode};

use crate::db;
use crate::state::AppState;

/// Liveness probe.
///
/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness probe: the document store is reachable.
///
/// GET /health/ready
pub async fn ready(State(state): State<AppState>) -> Result<&'static str, StatusCode> {
    let Some(pool) = state.pool() else {
        return Ok("ok");
    };
    match db::ping(pool).await {
        Ok(()) => Ok("ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
