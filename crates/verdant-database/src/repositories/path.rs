//! Materialized path repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use verdant_core::error::{AppError, ErrorKind};
use verdant_core::result::AppResult;
use verdant_entity::content::ContentPath;

/// Repository for the materialized path cache.
#[derive(Debug, Clone)]
pub struct PathRepository {
    pool: PgPool,
}

impl PathRepository {
    /// Create a new path repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace the cached path for a node.
    pub async fn upsert(
        &self,
        content_id: Uuid,
        path: &str,
        segments: &[String],
        depth: i32,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO content_paths (content_id, path, segments, depth, updated_at) \
             VALUES ($1, $2, $3, $4, NOW()) \
             ON CONFLICT (content_id) DO UPDATE \
               SET path = EXCLUDED.path, segments = EXCLUDED.segments, \
                   depth = EXCLUDED.depth, updated_at = NOW()",
        )
        .bind(content_id)
        .bind(path)
        .bind(segments)
        .bind(depth)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert path", e))?;
        Ok(())
    }

    /// Fetch the cached path row for a node.
    pub async fn find_by_content_id(&self, content_id: Uuid) -> AppResult<Option<ContentPath>> {
        sqlx::query_as::<_, ContentPath>("SELECT * FROM content_paths WHERE content_id = $1")
            .bind(content_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find path", e))
    }

    /// Resolve a full path string to its live node id within one owner's
    /// garden.
    pub async fn resolve(&self, owner_id: Uuid, path: &str) -> AppResult<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT p.content_id FROM content_paths p \
             JOIN content_nodes c ON c.id = p.content_id \
             WHERE c.owner_id = $1 AND p.path = $2 AND c.deleted_at IS NULL",
        )
        .bind(owner_id)
        .bind(path)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to resolve path", e))
    }

    /// Remove the cached path for a node.
    pub async fn delete(&self, content_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM content_paths WHERE content_id = $1")
            .bind(content_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete path", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Count cached path rows.
    pub async fn count(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content_paths")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count paths", e))?;
        Ok(count as u64)
    }
}
