//! Vault export handler.

use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::Response;

use verdant_core::error::AppError;

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/export/vault
///
/// Builds the archive synchronously and returns it as the response
/// body; the audit row is written before the bytes leave.
pub async fn export_vault(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Response> {
    let archive = state.export.export_vault(&user).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/zip")
        .header(
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", archive.file_name),
        )
        .header(CONTENT_LENGTH, archive.data.len())
        .body(Body::from(archive.data))
        .map_err(|e| AppError::internal(format!("Failed to build export response: {e}")))?;

    Ok(response)
}
