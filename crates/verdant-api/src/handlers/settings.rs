//! Settings handlers.

use axum::Json;
use axum::extract::State;

use verdant_entity::settings::UserSettings;

use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/settings
pub async fn get_settings(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<UserSettings>>> {
    let settings = state.settings.get(&user).await?;
    Ok(Json(ApiResponse::ok(settings)))
}

/// PATCH /api/settings
///
/// The body is a partial settings document; it is deep-merged into the
/// stored one, with `null` removing a key.
pub async fn update_settings(
    State(state): State<AppState>,
    user: AuthUser,
    Json(patch): Json<serde_json::Value>,
) -> ApiResult<Json<ApiResponse<UserSettings>>> {
    let settings = state.settings.update(&user, patch).await?;
    Ok(Json(ApiResponse::ok(settings)))
}

/// DELETE /api/settings
pub async fn reset_settings(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<UserSettings>>> {
    let settings = state.settings.reset(&user).await?;
    Ok(Json(ApiResponse::ok(settings)))
}
