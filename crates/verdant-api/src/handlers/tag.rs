//! Tag handlers.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use verdant_entity::content::ContentNode;
use verdant_entity::tag::{Tag, TagWithCount};
use verdant_service::tag::AttachedTag;

use crate::dto::request::SetTagsRequest;
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/tags
pub async fn list_tags(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<TagWithCount>>>> {
    let tags = state.tags.list_tags(&user).await?;
    Ok(Json(ApiResponse::ok(tags)))
}

/// GET /api/tags/{name}/content
pub async fn nodes_for_tag(
    State(state): State<AppState>,
    user: AuthUser,
    Path(name): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<ContentNode>>>> {
    let nodes = state.tags.nodes_for_tag(&user, &name).await?;
    Ok(Json(ApiResponse::ok(nodes)))
}

/// GET /api/content/{id}/tags
pub async fn tags_for_node(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<AttachedTag>>>> {
    let tags = state.tags.tags_for_node(&user, id).await?;
    Ok(Json(ApiResponse::ok(tags)))
}

/// PUT /api/content/{id}/tags
pub async fn set_tags(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SetTagsRequest>,
) -> ApiResult<Json<ApiResponse<Vec<Tag>>>> {
    let tags = state.tags.set_tags(&user, id, req.tags).await?;
    Ok(Json(ApiResponse::ok(tags)))
}
