//! Auth handlers — login, logout, refresh, me, sessions.

use std::net::{IpAddr, Ipv4Addr};

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use validator::Validate;

use verdant_core::error::AppError;

use crate::dto::request::{LoginRequest, RefreshRequest};
use crate::dto::response::{
    ApiResponse, LoginResponse, MessageResponse, SessionResponse, UserResponse,
};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::extractors::auth::{client_ip, user_agent};
use crate::state::AppState;

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    // Audit rows want a real address; an unparseable forwarded header
    // degrades to the unspecified address rather than failing the login.
    let ip: IpAddr = client_ip(&headers)
        .parse()
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    let result = state
        .sessions
        .login(&req.username, &req.password, ip, user_agent(&headers))
        .await?;

    Ok(Json(ApiResponse::ok(LoginResponse {
        access_token: result.tokens.access_token,
        refresh_token: result.tokens.refresh_token,
        access_expires_at: result.tokens.access_expires_at,
        refresh_expires_at: result.tokens.refresh_expires_at,
        user: UserResponse::from(result.user),
    })))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    state.sessions.logout(&user).await?;

    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Logged out successfully".to_string(),
    })))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    let result = state.sessions.refresh(&req.refresh_token).await?;

    Ok(Json(ApiResponse::ok(LoginResponse {
        access_token: result.tokens.access_token,
        refresh_token: result.tokens.refresh_token,
        access_expires_at: result.tokens.access_expires_at,
        refresh_expires_at: result.tokens.refresh_expires_at,
        user: UserResponse::from(result.user),
    })))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let profile = state.users.me(&user).await?;
    Ok(Json(ApiResponse::ok(UserResponse::from(profile))))
}

/// GET /api/auth/sessions
pub async fn sessions(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<SessionResponse>>>> {
    let sessions = state.sessions.list_sessions(&user).await?;
    Ok(Json(ApiResponse::ok(
        sessions.into_iter().map(SessionResponse::from).collect(),
    )))
}
