//! User settings repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use verdant_core::error::{AppError, ErrorKind};
use verdant_core::result::AppResult;
use verdant_entity::settings::UserSettingsRecord;

/// Repository for the per-user settings document.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    /// Create a new settings repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a user's stored settings document, if any.
    pub async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<UserSettingsRecord>> {
        sqlx::query_as::<_, UserSettingsRecord>(
            "SELECT * FROM user_settings WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find settings", e))
    }

    /// Insert or replace a user's settings document.
    pub async fn upsert(
        &self,
        user_id: Uuid,
        settings: &serde_json::Value,
    ) -> AppResult<UserSettingsRecord> {
        sqlx::query_as::<_, UserSettingsRecord>(
            "INSERT INTO user_settings (user_id, settings, updated_at) \
             VALUES ($1, $2, NOW()) \
             ON CONFLICT (user_id) DO UPDATE \
               SET settings = EXCLUDED.settings, updated_at = NOW() \
             RETURNING *",
        )
        .bind(user_id)
        .bind(settings)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert settings", e))
    }

    /// Remove a user's settings document, reverting them to defaults.
    pub async fn delete(&self, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM user_settings WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete settings", e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}
