//! Admin audit trail handlers.
//!
//! The audit service itself carries no role checks (it is also written
//! to by every other service), so these handlers gate on the request
//! context before querying.

use axum::Json;
use axum::extract::{Query, State};

use verdant_core::types::pagination::PageResponse;
use verdant_database::repositories::AuditSearchFilter;
use verdant_entity::audit::AuditLogEntry;
use verdant_service::AuditDashboard;

use crate::dto::request::{AuditSearchQuery, RecentQuery};
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// Hard cap for the recent-activity listing.
const MAX_RECENT_LIMIT: i64 = 500;

/// Default for the recent-activity listing.
const DEFAULT_RECENT_LIMIT: i64 = 50;

/// GET /api/admin/audit
pub async fn search(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AuditSearchQuery>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Json<ApiResponse<PageResponse<AuditLogEntry>>>> {
    user.require_admin()?;

    let filter = AuditSearchFilter {
        actor_id: query.actor_id,
        action: query.action,
        target_user_id: query.target_user_id,
        target_content_id: query.target_content_id,
        from: query.from,
        to: query.to,
    };
    let page = pagination.into_page_request();

    let entries = state.audit.search(&filter, &page).await?;
    Ok(Json(ApiResponse::ok(entries)))
}

/// GET /api/admin/audit/recent?limit=
pub async fn recent(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Json<ApiResponse<Vec<AuditLogEntry>>>> {
    user.require_admin()?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT);

    let entries = state.audit.recent(limit).await?;
    Ok(Json(ApiResponse::ok(entries)))
}

/// GET /api/admin/audit/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<AuditDashboard>>> {
    user.require_admin()?;

    let dashboard = state.audit.dashboard().await?;
    Ok(Json(ApiResponse::ok(dashboard)))
}
