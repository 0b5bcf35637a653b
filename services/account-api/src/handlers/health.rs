//! Health check handlers

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

const SERVICE: &str = "account-api";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub database: &'static str,
    pub latency_ms: u64,
}

/// GET /health - Liveness probe (no dependencies)
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE,
    })
}

/// GET /ready - Readiness probe (checks DB connectivity)
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let start = Instant::now();
    let db_result = sqlx::query("SELECT 1").execute(&*state.pool).await;
    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    match db_result {
        Ok(_) => (
            StatusCode::OK,
            Json(ReadyResponse {
                status: "ready",
                service: SERVICE,
                database: "ok",
                latency_ms,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    status: "unavailable",
                    service: SERVICE,
                    database: "error",
                    latency_ms,
                }),
            )
        }
    }
}
