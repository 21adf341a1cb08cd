//! Tag repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use verdant_core::error::{AppError, ErrorKind};
use verdant_core::result::AppResult;
use verdant_entity::content::ContentNode;
use verdant_entity::tag::{ContentTag, Tag, TagWithCount};

/// Repository for tags and their content attachments.
#[derive(Debug, Clone)]
pub struct TagRepository {
    pool: PgPool,
}

impl TagRepository {
    /// Create a new tag repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get or create a tag by owner-scoped name.
    pub async fn upsert(&self, owner_id: Uuid, name: &str) -> AppResult<Tag> {
        sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (owner_id, name) VALUES ($1, $2) \
             ON CONFLICT (owner_id, name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING *",
        )
        .bind(owner_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert tag", e))
    }

    /// Replace a node's tag attachments with a new set in one
    /// transaction. Each pair is a tag id and its occurrence positions.
    pub async fn replace_content_tags(
        &self,
        content_id: Uuid,
        attachments: &[(Uuid, serde_json::Value)],
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        sqlx::query("DELETE FROM content_tags WHERE content_id = $1")
            .bind(content_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear content tags", e)
            })?;

        for (tag_id, positions) in attachments {
            sqlx::query(
                "INSERT INTO content_tags (content_id, tag_id, positions) VALUES ($1, $2, $3)",
            )
            .bind(content_id)
            .bind(tag_id)
            .bind(positions)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to attach tag", e)
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit tag attachments", e)
        })?;
        Ok(())
    }

    /// Tags attached to a node, alphabetical.
    pub async fn find_tags_for_content(&self, content_id: Uuid) -> AppResult<Vec<Tag>> {
        sqlx::query_as::<_, Tag>(
            "SELECT t.* FROM tags t \
             JOIN content_tags ct ON ct.tag_id = t.id \
             WHERE ct.content_id = $1 \
             ORDER BY t.name ASC",
        )
        .bind(content_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list content tags", e))
    }

    /// Attachment rows for a node, including occurrence positions.
    pub async fn find_attachments(&self, content_id: Uuid) -> AppResult<Vec<ContentTag>> {
        sqlx::query_as::<_, ContentTag>(
            "SELECT * FROM content_tags WHERE content_id = $1 ORDER BY created_at ASC",
        )
        .bind(content_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list attachments", e))
    }

    /// An owner's tags with live usage counts, most used first.
    pub async fn list_with_counts(&self, owner_id: Uuid) -> AppResult<Vec<TagWithCount>> {
        sqlx::query_as::<_, TagWithCount>(
            "SELECT t.id, t.name, COUNT(c.id) AS content_count \
             FROM tags t \
             LEFT JOIN content_tags ct ON ct.tag_id = t.id \
             LEFT JOIN content_nodes c ON c.id = ct.content_id AND c.deleted_at IS NULL \
             WHERE t.owner_id = $1 \
             GROUP BY t.id, t.name \
             ORDER BY content_count DESC, t.name ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list tags", e))
    }

    /// Live nodes carrying a tag, by owner-scoped tag name.
    pub async fn find_nodes_by_tag(&self, owner_id: Uuid, name: &str) -> AppResult<Vec<ContentNode>> {
        sqlx::query_as::<_, ContentNode>(
            "SELECT c.* FROM content_nodes c \
             JOIN content_tags ct ON ct.content_id = c.id \
             JOIN tags t ON t.id = ct.tag_id \
             WHERE t.owner_id = $1 AND t.name = $2 AND c.deleted_at IS NULL \
             ORDER BY c.updated_at DESC",
        )
        .bind(owner_id)
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find nodes by tag", e))
    }

    /// Drop an owner's tags that no longer have any attachments. Returns
    /// how many were removed.
    pub async fn delete_orphans(&self, owner_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM tags \
             WHERE owner_id = $1 \
               AND NOT EXISTS (SELECT 1 FROM content_tags ct WHERE ct.tag_id = tags.id)",
        )
        .bind(owner_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to delete orphan tags", e)
        })?;
        Ok(result.rows_affected())
    }
}
