//! Admin path-cache maintenance handler.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, CountResponse};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/admin/paths/rebuild
pub async fn rebuild(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<CountResponse>>> {
    let rebuilt = state.content.rebuild_paths(&user).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count: rebuilt })))
}
