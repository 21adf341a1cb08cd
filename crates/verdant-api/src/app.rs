//! Application builder — wires services, router, and middleware into an
//! Axum app and runs it.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware as axum_middleware;
use sqlx::PgPool;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tower_http::trace::TraceLayer;
use tracing::warn;

use verdant_auth::{
    JwtDecoder, JwtEncoder, PasswordHasher, PasswordValidator, SessionCleanup, SessionManager,
};
use verdant_core::config::AppConfig;
use verdant_core::error::AppError;
use verdant_database::repositories::{
    AccountRepository, AuditLogRepository, ContentRepository, FilePayloadRepository,
    PathRepository, SessionRepository, SettingsRepository, TagRepository, UserRepository,
};
use verdant_service::{
    AdminUserService, AuditService, ContentService, ExportService, FileService, PathService,
    SessionService, SettingsService, TagService, UserService,
};
use verdant_storage::ProviderRegistry;

use crate::middleware::compression::build_compression_layer;
use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// How often expired session rows are swept.
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let max_upload = state.config.storage.max_upload_size_bytes as usize;
    let cors = build_cors_layer(&state.config.server.cors);

    build_router(state)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(build_compression_layer())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(request_logging))
}

/// Runs the Verdant server with the given configuration and database
/// pool. Blocks until shutdown.
pub async fn run_server(config: AppConfig, db_pool: PgPool) -> Result<(), AppError> {
    tracing::info!("Starting Verdant server");

    // ── Storage backends ─────────────────────────────────────────
    let registry = ProviderRegistry::from_config(&config.storage).await?;

    // ── Repositories ─────────────────────────────────────────────
    let user_repo = UserRepository::new(db_pool.clone());
    let session_repo = SessionRepository::new(db_pool.clone());
    let content_repo = ContentRepository::new(db_pool.clone());
    let file_repo = FilePayloadRepository::new(db_pool.clone());
    let path_repo = PathRepository::new(db_pool.clone());
    let tag_repo = TagRepository::new(db_pool.clone());
    let settings_repo = SettingsRepository::new(db_pool.clone());
    let account_repo = AccountRepository::new(db_pool.clone());
    let audit_repo = AuditLogRepository::new(db_pool.clone());

    // ── Auth components ──────────────────────────────────────────
    let hasher = PasswordHasher::new();
    let validator = PasswordValidator::new(&config.auth);
    let encoder = JwtEncoder::new(&config.auth);
    let decoder = JwtDecoder::new(&config.auth);
    let session_manager = SessionManager::new(
        user_repo.clone(),
        session_repo.clone(),
        encoder,
        decoder,
        hasher.clone(),
        config.auth.clone(),
        config.session.clone(),
    );

    // ── Services ─────────────────────────────────────────────────
    let audit = AuditService::new(audit_repo);
    let paths = PathService::new(content_repo.clone(), path_repo.clone());
    let content = ContentService::new(content_repo.clone(), paths.clone(), audit.clone());
    let files = FileService::new(
        content.clone(),
        content_repo.clone(),
        file_repo.clone(),
        paths.clone(),
        registry.clone(),
        audit.clone(),
        config.storage.clone(),
    );
    let tags = TagService::new(tag_repo, content.clone());
    let settings = SettingsService::new(settings_repo, audit.clone());
    let export = ExportService::new(
        content_repo.clone(),
        file_repo,
        path_repo,
        registry.clone(),
        settings.clone(),
        audit.clone(),
    );
    let sessions = SessionService::new(session_manager.clone(), user_repo.clone(), audit.clone());
    let users = UserService::new(
        user_repo.clone(),
        account_repo,
        session_manager.clone(),
        hasher.clone(),
        validator.clone(),
        audit.clone(),
    );
    let admin_users = AdminUserService::new(
        user_repo,
        content_repo,
        session_manager,
        hasher,
        validator,
        audit.clone(),
    );

    // ── Shutdown channel & session sweeper ───────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let cleanup = SessionCleanup::new(session_repo);
    let mut cleanup_rx = shutdown_rx.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = cleanup.run_cleanup().await {
                        warn!(error = %e, "Session cleanup failed");
                    }
                }
                _ = cleanup_rx.changed() => break,
            }
        }
    });

    // ── HTTP server ──────────────────────────────────────────────
    let app_state = AppState {
        config: Arc::new(config.clone()),
        db_pool,
        registry,
        sessions,
        users,
        admin_users,
        content,
        files,
        tags,
        settings,
        export,
        audit,
    };

    let app = build_app(app_state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(%addr, "Verdant server listening");

    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let mut drain_rx = shutdown_rx.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown({
        let mut rx = shutdown_rx;
        async move {
            let _ = rx.changed().await;
        }
    });

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    tokio::select! {
        result = server => {
            result.map_err(|e| AppError::internal(format!("Server error: {e}")))?;
        }
        _ = async {
            let _ = drain_rx.changed().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(
                grace_seconds = grace.as_secs(),
                "Shutdown grace period elapsed; dropping open connections"
            );
        }
    }

    Ok(())
}

/// Resolves when the process receives Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
