//! Admin user management handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use verdant_core::types::pagination::PageResponse;
use verdant_entity::user::User;
use verdant_service::user::admin::{CreateUserRequest, CreatedUser, UserDetail};
use verdant_service::user::service::UpdateProfileRequest;

use crate::dto::request::{ChangeRoleRequest, ChangeStatusRequest, UserSearchQuery};
use crate::dto::response::{ApiResponse, MessageResponse, TempPasswordResponse};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// GET /api/admin/users?q=&page=&page_size=
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(search): Query<UserSearchQuery>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Json<ApiResponse<PageResponse<User>>>> {
    let page = pagination.into_page_request();
    let users = match search.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => state.admin_users.search_users(&user, q, &page).await?,
        None => state.admin_users.list_users(&user, &page).await?,
    };

    Ok(Json(ApiResponse::ok(users)))
}

/// POST /api/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<Json<ApiResponse<CreatedUser>>> {
    let created = state.admin_users.create_user(&user, req).await?;
    Ok(Json(ApiResponse::ok(created)))
}

/// GET /api/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<UserDetail>>> {
    let detail = state.admin_users.get_user_detail(&user, id).await?;
    Ok(Json(ApiResponse::ok(detail)))
}

/// PUT /api/admin/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let updated = state.admin_users.update_user(&user, id, req).await?;
    Ok(Json(ApiResponse::ok(updated)))
}

/// PUT /api/admin/users/{id}/role
pub async fn update_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeRoleRequest>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let updated = state.admin_users.update_role(&user, id, req.role).await?;
    Ok(Json(ApiResponse::ok(updated)))
}

/// PUT /api/admin/users/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeStatusRequest>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let updated = state
        .admin_users
        .update_status(&user, id, req.status)
        .await?;
    Ok(Json(ApiResponse::ok(updated)))
}

/// POST /api/admin/users/{id}/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<TempPasswordResponse>>> {
    let temporary_password = state.admin_users.reset_password(&user, id).await?;
    Ok(Json(ApiResponse::ok(TempPasswordResponse {
        temporary_password,
    })))
}

/// DELETE /api/admin/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    state.admin_users.delete_user(&user, id).await?;

    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "User deleted".to_string(),
    })))
}
