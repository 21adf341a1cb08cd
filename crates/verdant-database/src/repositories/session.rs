//! Session repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use verdant_core::error::{AppError, ErrorKind};
use verdant_core::result::AppResult;
use verdant_entity::session::model::CreateSession;
use verdant_entity::session::Session;

/// Repository for authenticated session rows.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new session.
    pub async fn create(&self, data: &CreateSession) -> AppResult<Session> {
        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions \
               (id, user_id, token_hash, refresh_token_hash, ip_address, user_agent, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING *",
        )
        .bind(data.id)
        .bind(data.user_id)
        .bind(&data.token_hash)
        .bind(&data.refresh_token_hash)
        .bind(data.ip_address)
        .bind(&data.user_agent)
        .bind(data.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create session", e))
    }

    /// Find a session by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }

    /// List a user's live sessions, most recently active first.
    pub async fn find_active_by_user(&self, user_id: Uuid) -> AppResult<Vec<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions \
             WHERE user_id = $1 AND terminated_at IS NULL AND expires_at > NOW() \
             ORDER BY last_activity DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list sessions", e))
    }

    /// Bump a session's last-activity timestamp.
    pub async fn touch(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE sessions SET last_activity = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to touch session", e))?;
        Ok(())
    }

    /// Replace both token hashes after a refresh rotation.
    pub async fn rotate_tokens(
        &self,
        id: Uuid,
        token_hash: &str,
        refresh_token_hash: &str,
        expires_at: chrono::DateTime<chrono::Utc>,
    ) -> AppResult<Session> {
        sqlx::query_as::<_, Session>(
            "UPDATE sessions \
             SET token_hash = $2, refresh_token_hash = $3, expires_at = $4, last_activity = NOW() \
             WHERE id = $1 AND terminated_at IS NULL \
             RETURNING *",
        )
        .bind(id)
        .bind(token_hash)
        .bind(refresh_token_hash)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rotate session", e))?
        .ok_or_else(|| AppError::unauthorized("Session is no longer active"))
    }

    /// Terminate one session, recording who ended it and why.
    pub async fn terminate(
        &self,
        id: Uuid,
        terminated_by: Option<Uuid>,
        reason: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE sessions \
             SET terminated_at = NOW(), terminated_by = $2, terminated_reason = $3 \
             WHERE id = $1 AND terminated_at IS NULL",
        )
        .bind(id)
        .bind(terminated_by)
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to terminate session", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    /// Terminate every live session a user holds. Returns how many were
    /// ended.
    pub async fn terminate_all_for_user(
        &self,
        user_id: Uuid,
        terminated_by: Option<Uuid>,
        reason: &str,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE sessions \
             SET terminated_at = NOW(), terminated_by = $2, terminated_reason = $3 \
             WHERE user_id = $1 AND terminated_at IS NULL",
        )
        .bind(user_id)
        .bind(terminated_by)
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to terminate sessions", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Drop sessions whose hard expiry has passed. Returns how many rows
    /// were removed.
    pub async fn delete_expired(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete expired sessions", e)
            })?;
        Ok(result.rows_affected())
    }
}
