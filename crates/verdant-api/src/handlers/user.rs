//! User self-service handlers — profile, password, linked accounts.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use verdant_entity::account::Account;
use verdant_service::user::service::{ChangePasswordRequest, UpdateProfileRequest};

use crate::dto::response::{ApiResponse, MessageResponse, UserResponse};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// PUT /api/users/me
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let updated = state.users.update_profile(&user, req).await?;
    Ok(Json(ApiResponse::ok(UserResponse::from(updated))))
}

/// PUT /api/users/me/password
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    state.users.change_password(&user, req).await?;

    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Password changed; all sessions have been signed out".to_string(),
    })))
}

/// GET /api/users/me/accounts
pub async fn list_accounts(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<Account>>>> {
    let accounts = state.users.list_accounts(&user).await?;
    Ok(Json(ApiResponse::ok(accounts)))
}

/// DELETE /api/users/me/accounts/{id}
pub async fn unlink_account(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    state.users.unlink_account(&user, id).await?;

    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Account link removed".to_string(),
    })))
}
