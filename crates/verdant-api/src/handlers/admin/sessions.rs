//! Admin session termination handler.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use crate::dto::request::TerminateSessionRequest;
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/admin/sessions/{id}/terminate
pub async fn terminate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<TerminateSessionRequest>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    state
        .sessions
        .admin_terminate(&user, id, req.reason.as_deref())
        .await?;

    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Session terminated".to_string(),
    })))
}
