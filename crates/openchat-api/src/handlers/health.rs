//! Health check handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, EngineHealthResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// GET /api/health/metrics
pub async fn health_metrics(
    State(state): State<AppState>,
) -> Json<ApiResponse<EngineHealthResponse>> {
    let database = match sqlx::query("SELECT 1").execute(&state.db_pool).await {
        Ok(_) => "connected",
        Err(_) => "unreachable",
    };

    Json(ApiResponse::ok(EngineHealthResponse {
        status: "ok".to_string(),
        database: database.to_string(),
        rooms: state.manager.registry().room_count(),
        engine: state.manager.metrics().snapshot(),
    }))
}
