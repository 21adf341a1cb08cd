//! Route definitions for the Verdant HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`. The
//! router receives `AppState` and passes it to all handlers via Axum's
//! `State` extractor; authentication happens per-handler through the
//! `AuthUser` extractor, so routes without it (login, refresh, the
//! upload proxy, health) are the public surface.

use axum::Router;
use axum::routing::{delete, get, patch, post, put};

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(content_routes())
        .merge(file_routes())
        .merge(tag_routes())
        .merge(settings_routes())
        .merge(export_routes())
        .merge(admin_routes())
        .merge(health_routes());

    Router::new().nest("/api", api_routes).with_state(state)
}

/// Auth endpoints: login, logout, refresh, me, session listing.
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/sessions", get(handlers::auth::sessions))
}

/// User self-service endpoints.
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", put(handlers::user::update_profile))
        .route("/users/me/password", put(handlers::user::change_password))
        .route("/users/me/accounts", get(handlers::user::list_accounts))
        .route(
            "/users/me/accounts/{id}",
            delete(handlers::user::unlink_account),
        )
}

/// Content tree: notes, folders, ordering, trash.
fn content_routes() -> Router<AppState> {
    Router::new()
        .route("/content", get(handlers::content::list_children))
        .route("/content/notes", post(handlers::content::create_note))
        .route("/content/folders", post(handlers::content::create_folder))
        .route("/content/by-path", get(handlers::content::get_by_path))
        .route("/content/trash", get(handlers::content::list_trash))
        .route(
            "/content/repair-order",
            post(handlers::content::repair_order),
        )
        .route("/content/{id}", get(handlers::content::get_node))
        .route("/content/{id}", delete(handlers::content::delete))
        .route("/content/{id}/breadcrumb", get(handlers::content::breadcrumb))
        .route("/content/{id}/outline", get(handlers::content::outline))
        .route("/content/{id}/rename", put(handlers::content::rename))
        .route("/content/{id}/body", put(handlers::content::update_body))
        .route("/content/{id}/move", put(handlers::content::move_node))
        .route("/content/{id}/reorder", put(handlers::content::reorder))
        .route("/content/{id}/restore", post(handlers::content::restore))
        .route("/content/{id}/purge", delete(handlers::content::purge))
}

/// File upload and download flows.
fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/files", post(handlers::file::create_upload))
        .route("/files/proxy", put(handlers::file::proxy_upload))
        .route("/files/{id}", get(handlers::file::get_payload))
        .route("/files/{id}/complete", post(handlers::file::complete_upload))
        .route("/files/{id}/download-url", get(handlers::file::download_url))
        .route("/files/{id}/download", get(handlers::file::download))
        .route(
            "/files/{id}/external-link",
            delete(handlers::file::clear_external_link),
        )
}

/// Tag listing and per-node tag assignment.
fn tag_routes() -> Router<AppState> {
    Router::new()
        .route("/tags", get(handlers::tag::list_tags))
        .route("/tags/{name}/content", get(handlers::tag::nodes_for_tag))
        .route("/content/{id}/tags", get(handlers::tag::tags_for_node))
        .route("/content/{id}/tags", put(handlers::tag::set_tags))
}

/// Per-user settings document.
fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(handlers::settings::get_settings))
        .route("/settings", patch(handlers::settings::update_settings))
        .route("/settings", delete(handlers::settings::reset_settings))
}

/// Vault export.
fn export_routes() -> Router<AppState> {
    Router::new().route("/export/vault", post(handlers::export::export_vault))
}

/// Admin panel: users, audit trail, sessions, path maintenance.
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(handlers::admin::users::list_users))
        .route("/admin/users", post(handlers::admin::users::create_user))
        .route("/admin/users/{id}", get(handlers::admin::users::get_user))
        .route("/admin/users/{id}", put(handlers::admin::users::update_user))
        .route(
            "/admin/users/{id}",
            delete(handlers::admin::users::delete_user),
        )
        .route(
            "/admin/users/{id}/role",
            put(handlers::admin::users::update_role),
        )
        .route(
            "/admin/users/{id}/status",
            put(handlers::admin::users::update_status),
        )
        .route(
            "/admin/users/{id}/reset-password",
            post(handlers::admin::users::reset_password),
        )
        .route("/admin/audit", get(handlers::admin::audit::search))
        .route("/admin/audit/recent", get(handlers::admin::audit::recent))
        .route(
            "/admin/audit/dashboard",
            get(handlers::admin::audit::dashboard),
        )
        .route(
            "/admin/sessions/{id}/terminate",
            post(handlers::admin::sessions::terminate),
        )
        .route("/admin/paths/rebuild", post(handlers::admin::paths::rebuild))
}

/// Liveness and dependency health.
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}
