//! Content node repository implementation.
//!
//! Tree mutations that change parentage or slug also refresh the node's
//! own materialized path row in the same transaction, so the cache for
//! the written node can never lag behind the authoritative `parent_id`.
//! Descendant rows are refreshed by the caller afterwards, one node at a
//! time.

use sqlx::PgPool;
use uuid::Uuid;

use verdant_core::error::{AppError, ErrorKind};
use verdant_core::result::AppResult;
use verdant_entity::content::model::CreateContentNode;
use verdant_entity::content::ContentNode;

/// Repository for content tree CRUD and query operations.
#[derive(Debug, Clone)]
pub struct ContentRepository {
    pool: PgPool,
}

impl ContentRepository {
    /// Create a new content repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a node by primary key, including soft-deleted ones.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ContentNode>> {
        sqlx::query_as::<_, ContentNode>("SELECT * FROM content_nodes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find node by id", e))
    }

    /// Find a live (not soft-deleted) node by primary key.
    pub async fn find_live_by_id(&self, id: Uuid) -> AppResult<Option<ContentNode>> {
        sqlx::query_as::<_, ContentNode>(
            "SELECT * FROM content_nodes WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find node by id", e))
    }

    /// Find a live node by its owner-scoped slug.
    pub async fn find_by_slug(&self, owner_id: Uuid, slug: &str) -> AppResult<Option<ContentNode>> {
        sqlx::query_as::<_, ContentNode>(
            "SELECT * FROM content_nodes \
             WHERE owner_id = $1 AND slug = $2 AND deleted_at IS NULL",
        )
        .bind(owner_id)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find node by slug", e))
    }

    /// Check whether a slug is taken within an owner's garden.
    ///
    /// Soft-deleted nodes still hold their slug so a restore cannot
    /// collide.
    pub async fn slug_exists(
        &self,
        owner_id: Uuid,
        slug: &str,
        exclude_id: Option<Uuid>,
    ) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS( \
               SELECT 1 FROM content_nodes \
               WHERE owner_id = $1 AND slug = $2 AND ($3::uuid IS NULL OR id <> $3) \
             )",
        )
        .bind(owner_id)
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check slug", e))
    }

    /// List the live children of a parent (root level when `parent_id`
    /// is None), ordered by display order.
    pub async fn find_children(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<ContentNode>> {
        sqlx::query_as::<_, ContentNode>(
            "SELECT * FROM content_nodes \
             WHERE owner_id = $1 AND parent_id IS NOT DISTINCT FROM $2 AND deleted_at IS NULL \
             ORDER BY display_order ASC, created_at ASC",
        )
        .bind(owner_id)
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))
    }

    /// Next free display order at the end of a sibling set.
    pub async fn next_display_order(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<i32> {
        sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(display_order) + 1, 0) FROM content_nodes \
             WHERE owner_id = $1 AND parent_id IS NOT DISTINCT FROM $2 AND deleted_at IS NULL",
        )
        .bind(owner_id)
        .bind(parent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to compute display order", e)
        })
    }

    /// Insert a node together with its materialized path row.
    pub async fn create(
        &self,
        data: &CreateContentNode,
        path: &str,
        segments: &[String],
        depth: i32,
    ) -> AppResult<ContentNode> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let node = sqlx::query_as::<_, ContentNode>(
            "INSERT INTO content_nodes \
               (owner_id, parent_id, kind, title, slug, display_order, body) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING *",
        )
        .bind(data.owner_id)
        .bind(data.parent_id)
        .bind(data.kind)
        .bind(&data.title)
        .bind(&data.slug)
        .bind(data.display_order)
        .bind(&data.body)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("content_nodes_owner_id_slug_key") =>
            {
                AppError::conflict(format!("Slug '{}' already exists", data.slug))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create node", e),
        })?;

        upsert_path(&mut tx, node.id, path, segments, depth).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit node creation", e)
        })?;
        Ok(node)
    }

    /// Update a node's title and slug, refreshing its path row in the
    /// same transaction.
    pub async fn rename(
        &self,
        id: Uuid,
        title: &str,
        slug: &str,
        path: &str,
        segments: &[String],
        depth: i32,
    ) -> AppResult<ContentNode> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let node = sqlx::query_as::<_, ContentNode>(
            "UPDATE content_nodes SET title = $2, slug = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(title)
        .bind(slug)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("content_nodes_owner_id_slug_key") =>
            {
                AppError::conflict(format!("Slug '{slug}' already exists"))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to rename node", e),
        })?
        .ok_or_else(|| AppError::not_found(format!("Content node {id} not found")))?;

        upsert_path(&mut tx, node.id, path, segments, depth).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit rename", e)
        })?;
        Ok(node)
    }

    /// Reparent a node, refreshing its path row in the same transaction.
    pub async fn move_node(
        &self,
        id: Uuid,
        new_parent_id: Option<Uuid>,
        display_order: i32,
        path: &str,
        segments: &[String],
        depth: i32,
    ) -> AppResult<ContentNode> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let node = sqlx::query_as::<_, ContentNode>(
            "UPDATE content_nodes SET parent_id = $2, display_order = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(new_parent_id)
        .bind(display_order)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to move node", e))?
        .ok_or_else(|| AppError::not_found(format!("Content node {id} not found")))?;

        upsert_path(&mut tx, node.id, path, segments, depth).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit move", e)
        })?;
        Ok(node)
    }

    /// Update a note's rich-text body.
    pub async fn update_body(&self, id: Uuid, body: &serde_json::Value) -> AppResult<ContentNode> {
        sqlx::query_as::<_, ContentNode>(
            "UPDATE content_nodes SET body = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING *",
        )
        .bind(id)
        .bind(body)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update body", e))?
        .ok_or_else(|| AppError::not_found(format!("Content node {id} not found")))
    }

    /// Find the live sibling currently holding `display_order`, if any.
    ///
    /// First step of the reorder bump. The read and the two writes that
    /// follow are separate statements by design.
    pub async fn find_sibling_at_order(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        display_order: i32,
        exclude_id: Uuid,
    ) -> AppResult<Option<ContentNode>> {
        sqlx::query_as::<_, ContentNode>(
            "SELECT * FROM content_nodes \
             WHERE owner_id = $1 AND parent_id IS NOT DISTINCT FROM $2 \
               AND display_order = $3 AND id <> $4 AND deleted_at IS NULL \
             ORDER BY created_at ASC LIMIT 1",
        )
        .bind(owner_id)
        .bind(parent_id)
        .bind(display_order)
        .bind(exclude_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find sibling", e))
    }

    /// Write a node's display order. One bare UPDATE, no transaction.
    pub async fn set_display_order(&self, id: Uuid, display_order: i32) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE content_nodes SET display_order = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(display_order)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to set display order", e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Content node {id} not found")));
        }
        Ok(())
    }

    /// Renumber a sibling set to contiguous 0..N-1, returning how many
    /// rows moved. The repair utility for display-order drift.
    pub async fn repair_sibling_orders(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "WITH ranked AS ( \
               SELECT id, \
                      (ROW_NUMBER() OVER (ORDER BY display_order ASC, created_at ASC, id ASC) - 1)::int \
                        AS new_order \
               FROM content_nodes \
               WHERE owner_id = $1 AND parent_id IS NOT DISTINCT FROM $2 AND deleted_at IS NULL \
             ) \
             UPDATE content_nodes SET display_order = ranked.new_order, updated_at = NOW() \
             FROM ranked \
             WHERE content_nodes.id = ranked.id AND content_nodes.display_order <> ranked.new_order",
        )
        .bind(owner_id)
        .bind(parent_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to repair sibling orders", e)
        })?;

        Ok(result.rows_affected())
    }

    /// Soft-delete a node and its whole live subtree, returning how many
    /// rows were marked. The shared timestamp lets a restore bring back
    /// exactly this cohort.
    pub async fn soft_delete_subtree(&self, id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "WITH RECURSIVE subtree AS ( \
               SELECT id FROM content_nodes WHERE id = $1 \
               UNION ALL \
               SELECT c.id FROM content_nodes c JOIN subtree s ON c.parent_id = s.id \
             ) \
             UPDATE content_nodes SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id IN (SELECT id FROM subtree) AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to soft-delete node", e))?;

        Ok(result.rows_affected())
    }

    /// Restore a soft-deleted node together with the descendants that
    /// were deleted in the same sweep.
    pub async fn restore_subtree(&self, id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "WITH RECURSIVE subtree AS ( \
               SELECT id FROM content_nodes WHERE id = $1 \
               UNION ALL \
               SELECT c.id FROM content_nodes c JOIN subtree s ON c.parent_id = s.id \
             ) \
             UPDATE content_nodes SET deleted_at = NULL, updated_at = NOW() \
             WHERE id IN (SELECT id FROM subtree) \
               AND deleted_at = (SELECT deleted_at FROM content_nodes WHERE id = $1)",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to restore node", e))?;

        Ok(result.rows_affected())
    }

    /// Permanently remove a node. Payload, path, and tag rows go with it
    /// through foreign key cascades.
    pub async fn hard_delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM content_nodes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete node", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// List an owner's soft-deleted nodes, most recently deleted first.
    pub async fn find_deleted(&self, owner_id: Uuid) -> AppResult<Vec<ContentNode>> {
        sqlx::query_as::<_, ContentNode>(
            "SELECT * FROM content_nodes \
             WHERE owner_id = $1 AND deleted_at IS NOT NULL \
             ORDER BY deleted_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list deleted nodes", e))
    }

    /// IDs of all live descendants of a node (children first, then
    /// deeper levels).
    pub async fn descendant_ids(&self, id: Uuid) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "WITH RECURSIVE descendants AS ( \
               SELECT id, 1 AS lvl FROM content_nodes \
               WHERE parent_id = $1 AND deleted_at IS NULL \
               UNION ALL \
               SELECT c.id, d.lvl + 1 FROM content_nodes c \
               JOIN descendants d ON c.parent_id = d.id \
               WHERE c.deleted_at IS NULL \
             ) \
             SELECT id FROM descendants ORDER BY lvl ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list descendants", e))
    }

    /// Check whether `node_id` lies inside the subtree rooted at
    /// `ancestor_id` (inclusive). Used to reject cycle-creating moves.
    pub async fn is_in_subtree(&self, ancestor_id: Uuid, node_id: Uuid) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "WITH RECURSIVE subtree AS ( \
               SELECT id FROM content_nodes WHERE id = $1 \
               UNION ALL \
               SELECT c.id FROM content_nodes c JOIN subtree s ON c.parent_id = s.id \
             ) \
             SELECT EXISTS(SELECT 1 FROM subtree WHERE id = $2)",
        )
        .bind(ancestor_id)
        .bind(node_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check subtree", e))
    }

    /// IDs of every live node across all owners, oldest first. Feed for
    /// the offline path rebuild sweep.
    pub async fn all_live_ids(&self) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM content_nodes WHERE deleted_at IS NULL ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list live nodes", e))
    }

    /// List every live node owned by one user, oldest first. Feeds the
    /// vault export.
    pub async fn find_live_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<ContentNode>> {
        sqlx::query_as::<_, ContentNode>(
            "SELECT * FROM content_nodes \
             WHERE owner_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list owner nodes", e))
    }

    /// Count an owner's live nodes.
    pub async fn count_live(&self, owner_id: Uuid) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM content_nodes WHERE owner_id = $1 AND deleted_at IS NULL",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count nodes", e))?;
        Ok(count as u64)
    }
}

/// Upsert a materialized path row inside an open transaction.
async fn upsert_path(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
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
    .execute(&mut **tx)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert path", e))?;
    Ok(())
}
