//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use sqlx::PgPool;

use verdant_core::config::AppConfig;
use verdant_service::{
    AdminUserService, AuditService, ContentService, ExportService, FileService, SessionService,
    SettingsService, TagService, UserService,
};
use verdant_storage::ProviderRegistry;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. Services carry
/// their own cheaply-cloneable dependencies, so the state clones without
/// extra wrapping; only the configuration is shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool, used directly only by health checks.
    pub db_pool: PgPool,
    /// Storage provider registry, used directly only by health checks.
    pub registry: ProviderRegistry,

    /// Login, logout, refresh, and request authentication.
    pub sessions: SessionService,
    /// Profile self-service.
    pub users: UserService,
    /// Admin user management.
    pub admin_users: AdminUserService,
    /// Content tree operations.
    pub content: ContentService,
    /// File upload and download flows.
    pub files: FileService,
    /// Tagging.
    pub tags: TagService,
    /// Per-user settings documents.
    pub settings: SettingsService,
    /// Vault export.
    pub export: ExportService,
    /// Audit trail queries.
    pub audit: AuditService,
}
