//! File handlers — upload provisioning, the upload proxy, downloads,
//! and payload maintenance.

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::Response;
use bytes::Bytes;
use uuid::Uuid;

use verdant_core::error::AppError;
use verdant_entity::file::FilePayload;
use verdant_service::file::{CreateFileUpload, CreatedUpload};

use crate::dto::request::ProxyQuery;
use crate::dto::response::{ApiResponse, DownloadUrlResponse, MessageResponse};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/files
pub async fn create_upload(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateFileUpload>,
) -> ApiResult<Json<ApiResponse<CreatedUpload>>> {
    let created = state.files.create_upload(&user, req).await?;
    Ok(Json(ApiResponse::ok(created)))
}

/// PUT /api/files/proxy?token=
///
/// Receives bytes for backends without native presigned uploads. The
/// token is the whole credential, so this route takes no `AuthUser`.
pub async fn proxy_upload(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
    body: Bytes,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    state.files.proxy_upload(&query.token, body).await?;

    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Upload received".to_string(),
    })))
}

/// POST /api/files/{id}/complete
pub async fn complete_upload(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<FilePayload>>> {
    let payload = state.files.complete_upload(&user, id).await?;
    Ok(Json(ApiResponse::ok(payload)))
}

/// GET /api/files/{id}
pub async fn get_payload(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<FilePayload>>> {
    let payload = state.files.payload_for(&user, id).await?;
    Ok(Json(ApiResponse::ok(payload)))
}

/// GET /api/files/{id}/download-url
pub async fn download_url(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<DownloadUrlResponse>>> {
    let url = state.files.download_url(&user, id).await?;
    Ok(Json(ApiResponse::ok(DownloadUrlResponse { url })))
}

/// GET /api/files/{id}/download
///
/// Streams the bytes through the application instead of redirecting to
/// a backend URL.
pub async fn download(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let node = state.content.get_node(&user, id).await?;
    let (payload, stream) = state.files.stream_file(&user, id).await?;

    let file_name = node.title.replace(['"', '\\', '\r', '\n'], "_");

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, payload.mime_type.as_str())
        .header(
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        )
        .header(CONTENT_LENGTH, payload.file_size)
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::internal(format!("Failed to build download response: {e}")))?;

    Ok(response)
}

/// DELETE /api/files/{id}/external-link
pub async fn clear_external_link(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<FilePayload>>> {
    let payload = state.files.clear_external_link(&user, id).await?;
    Ok(Json(ApiResponse::ok(payload)))
}
