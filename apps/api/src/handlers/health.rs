use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use super::ApiJson;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: &'static str,
    pub version: &'static str,
    pub database: bool,
}

/// GET /
pub async fn banner() -> &'static str {
    concat!("Stockroom back-office API v", env!("CARGO_PKG_VERSION"))
}

/// GET /health
///
/// 503 when the database does not answer.
pub async fn health(State(state): State<AppState>) -> (StatusCode, ApiJson<HealthResponse>) {
    let database = state.db.health_check().await;
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        ApiJson(HealthResponse {
            status: if database { "healthy" } else { "unhealthy" },
            version: env!("CARGO_PKG_VERSION"),
            database,
        }),
    )
}
