//! Health check handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, DetailedHealthResponse, HealthResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/health
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// GET /api/health/detailed
///
/// Probes the database and every configured storage backend. Always
/// returns 200; degradation is reported in the body.
pub async fn health_detailed(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<DetailedHealthResponse>>> {
    let database = sqlx::query("SELECT 1")
        .execute(&state.db_pool)
        .await
        .is_ok();

    let storage: std::collections::HashMap<String, bool> = state
        .registry
        .health_check_all()
        .await
        .into_iter()
        .map(|(kind, healthy)| (kind.to_string(), healthy))
        .collect();

    let status = if database && storage.values().all(|&healthy| healthy) {
        "ok"
    } else {
        "degraded"
    };

    Ok(Json(ApiResponse::ok(DetailedHealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        storage,
    })))
}
