//! File payload repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use verdant_core::error::{AppError, ErrorKind};
use verdant_core::result::AppResult;
use verdant_entity::content::model::CreateContentNode;
use verdant_entity::content::ContentNode;
use verdant_entity::file::model::CreateFilePayload;
use verdant_entity::file::{FilePayload, UploadStatus};

/// Repository for file payload rows and their owning nodes.
#[derive(Debug, Clone)]
pub struct FilePayloadRepository {
    pool: PgPool,
}

impl FilePayloadRepository {
    /// Create a new file payload repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a file node, its payload row, and its path row in one
    /// transaction. A file node never exists without a payload.
    pub async fn create_with_node(
        &self,
        node: &CreateContentNode,
        payload: &CreateFilePayload,
        path: &str,
        segments: &[String],
        depth: i32,
    ) -> AppResult<(ContentNode, FilePayload)> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let created_node = sqlx::query_as::<_, ContentNode>(
            "INSERT INTO content_nodes \
               (owner_id, parent_id, kind, title, slug, display_order, body) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING *",
        )
        .bind(node.owner_id)
        .bind(node.parent_id)
        .bind(node.kind)
        .bind(&node.title)
        .bind(&node.slug)
        .bind(node.display_order)
        .bind(&node.body)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("content_nodes_owner_id_slug_key") =>
            {
                AppError::conflict(format!("Slug '{}' already exists", node.slug))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create file node", e),
        })?;

        let created_payload = sqlx::query_as::<_, FilePayload>(
            "INSERT INTO file_payloads \
               (content_id, storage_provider, storage_key, mime_type, file_size) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING *",
        )
        .bind(created_node.id)
        .bind(payload.storage_provider)
        .bind(&payload.storage_key)
        .bind(&payload.mime_type)
        .bind(payload.file_size)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create file payload", e)
        })?;

        sqlx::query(
            "INSERT INTO content_paths (content_id, path, segments, depth, updated_at) \
             VALUES ($1, $2, $3, $4, NOW()) \
             ON CONFLICT (content_id) DO UPDATE \
               SET path = EXCLUDED.path, segments = EXCLUDED.segments, \
                   depth = EXCLUDED.depth, updated_at = NOW()",
        )
        .bind(created_node.id)
        .bind(path)
        .bind(segments)
        .bind(depth)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert path", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit file creation", e)
        })?;

        Ok((created_node, created_payload))
    }

    /// Fetch the payload attached to a content node.
    pub async fn find_by_content_id(&self, content_id: Uuid) -> AppResult<Option<FilePayload>> {
        sqlx::query_as::<_, FilePayload>("SELECT * FROM file_payloads WHERE content_id = $1")
            .bind(content_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find payload", e))
    }

    /// Fetch a payload by its storage key. Upload callbacks arrive keyed
    /// this way.
    pub async fn find_by_storage_key(&self, storage_key: &str) -> AppResult<Option<FilePayload>> {
        sqlx::query_as::<_, FilePayload>("SELECT * FROM file_payloads WHERE storage_key = $1")
            .bind(storage_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find payload", e))
    }

    /// Flip a payload to ready and record the size the backend reported.
    pub async fn mark_ready(&self, id: Uuid, file_size: i64) -> AppResult<FilePayload> {
        sqlx::query_as::<_, FilePayload>(
            "UPDATE file_payloads \
             SET upload_status = $2, file_size = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(UploadStatus::Ready)
        .bind(file_size)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark payload ready", e))?
        .ok_or_else(|| AppError::not_found(format!("File payload {id} not found")))
    }

    /// Replace a payload's storage metadata document.
    pub async fn update_metadata(
        &self,
        id: Uuid,
        metadata: &serde_json::Value,
    ) -> AppResult<FilePayload> {
        sqlx::query_as::<_, FilePayload>(
            "UPDATE file_payloads SET storage_metadata = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(metadata)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update metadata", e))?
        .ok_or_else(|| AppError::not_found(format!("File payload {id} not found")))
    }

    /// Remove the payload row for a content node.
    pub async fn delete_by_content_id(&self, content_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM file_payloads WHERE content_id = $1")
            .bind(content_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete payload", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Payloads for all live, ready file nodes of one owner. Feed for
    /// the vault export.
    pub async fn find_ready_for_owner(&self, owner_id: Uuid) -> AppResult<Vec<FilePayload>> {
        sqlx::query_as::<_, FilePayload>(
            "SELECT p.* FROM file_payloads p \
             JOIN content_nodes c ON c.id = p.content_id \
             WHERE c.owner_id = $1 AND c.deleted_at IS NULL AND p.upload_status = $2 \
             ORDER BY p.created_at ASC",
        )
        .bind(owner_id)
        .bind(UploadStatus::Ready)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list payloads", e))
    }

    /// List every payload in the subtree rooted at `root_id`, trashed
    /// nodes included. Used when purging a subtree to release the stored
    /// bytes before the rows go.
    pub async fn find_in_subtree(&self, root_id: Uuid) -> AppResult<Vec<FilePayload>> {
        sqlx::query_as::<_, FilePayload>(
            "WITH RECURSIVE subtree AS ( \
               SELECT id FROM content_nodes WHERE id = $1 \
               UNION ALL \
               SELECT c.id FROM content_nodes c JOIN subtree s ON c.parent_id = s.id \
             ) \
             SELECT p.* FROM file_payloads p \
             JOIN subtree s ON s.id = p.content_id",
        )
        .bind(root_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list subtree payloads", e)
        })
    }
}
