//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use bytes::Bytes;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use verdant_api::{AppState, build_app};
use verdant_auth::{JwtDecoder, JwtEncoder, PasswordHasher, PasswordValidator, SessionManager};
use verdant_core::config::AppConfig;
use verdant_database::connect_pool;
use verdant_database::repositories::{
    AccountRepository, AuditLogRepository, ContentRepository, FilePayloadRepository,
    PathRepository, SessionRepository, SettingsRepository, TagRepository, UserRepository,
};
use verdant_entity::file::provider::StorageProviderKind;
use verdant_service::{
    AdminUserService, AuditService, ContentService, ExportService, FileService, PathService,
    SessionService, SettingsService, TagService, UserService,
};
use verdant_storage::ProviderRegistry;
use verdant_storage::testing::MemoryStorageProvider;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Database pool for direct queries
    pub db_pool: PgPool,
    /// Application config
    pub config: AppConfig,
    /// The in-memory storage backend behind the registry's object slot
    pub storage: MemoryStorageProvider,
}

/// A fixture name that will not collide across parallel or repeated
/// test runs.
pub fn unique_name(prefix: &str) -> String {
    let tag = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &tag[..8])
}

impl TestApp {
    /// Create a new test application wired against the test database
    /// and an in-memory storage backend.
    pub async fn new() -> Self {
        let config = AppConfig::load("test").expect("Failed to load test config");

        let db_pool = connect_pool(&config.database)
            .await
            .expect("Failed to connect to test database");

        verdant_database::migration::run_migrations(&db_pool)
            .await
            .expect("Failed to run migrations");

        let storage = MemoryStorageProvider::new();
        let registry = ProviderRegistry::new(
            Some(Arc::new(storage.clone())),
            None,
            StorageProviderKind::ObjectStorage,
        )
        .expect("Failed to build storage registry");

        let user_repo = UserRepository::new(db_pool.clone());
        let session_repo = SessionRepository::new(db_pool.clone());
        let content_repo = ContentRepository::new(db_pool.clone());
        let file_repo = FilePayloadRepository::new(db_pool.clone());
        let path_repo = PathRepository::new(db_pool.clone());
        let tag_repo = TagRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new(db_pool.clone());
        let account_repo = AccountRepository::new(db_pool.clone());
        let audit_repo = AuditLogRepository::new(db_pool.clone());

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
        let sessions =
            SessionService::new(session_manager.clone(), user_repo.clone(), audit.clone());
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

        let state = AppState {
            config: Arc::new(config.clone()),
            db_pool: db_pool.clone(),
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

        let router = build_app(state);

        Self {
            router,
            db_pool,
            config,
            storage,
        }
    }

    /// Create a user directly in the database and return their ID
    pub async fn create_test_user(&self, username: &str, password: &str, role: &str) -> Uuid {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash_password(password).expect("Failed to hash password");
        let id = Uuid::new_v4();

        sqlx::query(
            r#"INSERT INTO users (id, username, email, password_hash, display_name, role, status)
               VALUES ($1, $2, $3, $4, $5, $6::user_role, 'active'::user_status)"#,
        )
        .bind(id)
        .bind(username)
        .bind(format!("{username}@example.com"))
        .bind(&hash)
        .bind(username)
        .bind(role)
        .execute(&self.db_pool)
        .await
        .expect("Failed to create test user");

        id
    }

    /// Login and return the JWT access token
    pub async fn login(&self, username: &str, password: &str) -> String {
        let body = serde_json::json!({
            "username": username,
            "password": password,
        });

        let response = self
            .request("POST", "/api/auth/login", Some(body), None)
            .await;

        assert_eq!(
            response.status,
            StatusCode::OK,
            "Login failed: {:?}",
            response.body
        );

        response.body["data"]["access_token"]
            .as_str()
            .expect("No access_token in login response")
            .to_string()
    }

    /// Make a JSON request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let (status, _headers, bytes) = self.request_raw(method, path, body, token).await;
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse { status, body }
    }

    /// Make a request and return the raw response for binary endpoints
    pub async fn request_raw(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, HeaderMap, Bytes) {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024 * 1024)
            .await
            .expect("Failed to read body");

        (status, headers, bytes)
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
