//! Content tree handlers — notes, folders, ordering, trash.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;
use validator::Validate;

use verdant_core::error::AppError;
use verdant_entity::content::{ContentKind, ContentNode, ContentPath};
use verdant_service::OutlineItem;
use verdant_service::content::service::{CreateFolderRequest, CreateNoteRequest};

use crate::dto::request::{
    ByPathQuery, MoveRequest, RenameRequest, ReorderRequest, SiblingQuery, UpdateBodyRequest,
};
use crate::dto::response::{ApiResponse, CountResponse, MessageResponse};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/content/notes
pub async fn create_note(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateNoteRequest>,
) -> ApiResult<Json<ApiResponse<ContentNode>>> {
    let node = state.content.create_note(&user, req).await?;
    Ok(Json(ApiResponse::ok(node)))
}

/// POST /api/content/folders
pub async fn create_folder(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateFolderRequest>,
) -> ApiResult<Json<ApiResponse<ContentNode>>> {
    let node = state.content.create_folder(&user, req).await?;
    Ok(Json(ApiResponse::ok(node)))
}

/// GET /api/content?parent_id=
pub async fn list_children(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SiblingQuery>,
) -> ApiResult<Json<ApiResponse<Vec<ContentNode>>>> {
    let children = state.content.list_children(&user, query.parent_id).await?;
    Ok(Json(ApiResponse::ok(children)))
}

/// GET /api/content/by-path?path=
pub async fn get_by_path(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ByPathQuery>,
) -> ApiResult<Json<ApiResponse<ContentNode>>> {
    let node = state.content.get_by_path(&user, &query.path).await?;
    Ok(Json(ApiResponse::ok(node)))
}

/// GET /api/content/trash
pub async fn list_trash(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<ContentNode>>>> {
    let trashed = state.content.list_trash(&user).await?;
    Ok(Json(ApiResponse::ok(trashed)))
}

/// GET /api/content/{id}
pub async fn get_node(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<ContentNode>>> {
    let node = state.content.get_node(&user, id).await?;
    Ok(Json(ApiResponse::ok(node)))
}

/// GET /api/content/{id}/breadcrumb
pub async fn breadcrumb(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<ContentPath>>> {
    let path = state.content.breadcrumb(&user, id).await?;
    Ok(Json(ApiResponse::ok(path)))
}

/// GET /api/content/{id}/outline
pub async fn outline(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<OutlineItem>>>> {
    let outline = state.content.outline(&user, id).await?;
    Ok(Json(ApiResponse::ok(outline)))
}

/// PUT /api/content/{id}/rename
pub async fn rename(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RenameRequest>,
) -> ApiResult<Json<ApiResponse<ContentNode>>> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let node = state.content.rename(&user, id, &req.title).await?;
    Ok(Json(ApiResponse::ok(node)))
}

/// PUT /api/content/{id}/body
pub async fn update_body(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateBodyRequest>,
) -> ApiResult<Json<ApiResponse<ContentNode>>> {
    let node = state.content.update_body(&user, id, req.body).await?;
    Ok(Json(ApiResponse::ok(node)))
}

/// PUT /api/content/{id}/move
pub async fn move_node(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<MoveRequest>,
) -> ApiResult<Json<ApiResponse<ContentNode>>> {
    let node = state.content.move_node(&user, id, req.parent_id).await?;
    Ok(Json(ApiResponse::ok(node)))
}

/// PUT /api/content/{id}/reorder
pub async fn reorder(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ReorderRequest>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    state.content.reorder(&user, id, req.display_order).await?;

    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Order updated".to_string(),
    })))
}

/// POST /api/content/repair-order?parent_id=
pub async fn repair_order(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SiblingQuery>,
) -> ApiResult<Json<ApiResponse<CountResponse>>> {
    let repaired = state.content.repair_order(&user, query.parent_id).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count: repaired })))
}

/// DELETE /api/content/{id}
///
/// File nodes route through the file service so their stored bytes are
/// released alongside the soft delete.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<CountResponse>>> {
    let node = state.content.get_node(&user, id).await?;
    let deleted = if node.kind == ContentKind::File {
        state.files.delete_file(&user, id).await?
    } else {
        state.content.delete(&user, id).await?
    };

    Ok(Json(ApiResponse::ok(CountResponse { count: deleted })))
}

/// POST /api/content/{id}/restore
pub async fn restore(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<CountResponse>>> {
    let restored = state.content.restore(&user, id).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count: restored })))
}

/// DELETE /api/content/{id}/purge
pub async fn purge(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<CountResponse>>> {
    let purged = state.files.purge_trashed(&user, id).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count: purged })))
}
