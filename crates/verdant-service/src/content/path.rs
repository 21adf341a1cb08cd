//! Materialized path computation and cache maintenance.
//!
//! `parent_id` is the authoritative tree structure; `content_paths` is a
//! cache derived from it. Every operation that changes parentage or a
//! slug recomputes the affected paths itself, so the cache only goes
//! stale through outside interference — `rebuild_all_paths` is the
//! repair tool for that case.

use tracing::info;
use uuid::Uuid;

use verdant_core::error::AppError;
use verdant_core::result::AppResult;
use verdant_database::repositories::{ContentRepository, PathRepository};
use verdant_entity::content::ContentPath;

/// Hard ceiling on path segments. Doubles as the cycle guard: a
/// `parent_id` loop keeps accumulating segments until it trips this.
pub const MAX_PATH_SEGMENTS: usize = 100;

/// A freshly computed materialized path, before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedPath {
    /// Slash-joined slugs, root first.
    pub path: String,
    /// The individual segments, root first.
    pub segments: Vec<String>,
    /// Number of ancestors.
    pub depth: i32,
}

/// Computes and maintains the materialized path cache.
#[derive(Debug, Clone)]
pub struct PathService {
    content: ContentRepository,
    paths: PathRepository,
}

impl PathService {
    /// Creates a new path service.
    pub fn new(content: ContentRepository, paths: PathRepository) -> Self {
        Self { content, paths }
    }

    /// Computes a node's path by walking `parent_id` links upward.
    ///
    /// Errors with `Limit` once more than [`MAX_PATH_SEGMENTS`] segments
    /// accumulate, which also catches parent cycles.
    pub async fn generate_content_path(&self, content_id: Uuid) -> AppResult<ComputedPath> {
        let node = self
            .content
            .find_by_id(content_id)
            .await?
            .ok_or_else(|| AppError::not_found("Content node not found"))?;

        let mut segments = vec![node.slug.clone()];
        let mut cursor = node;

        while let Some(parent_id) = cursor.parent_id {
            cursor = self
                .content
                .find_by_id(parent_id)
                .await?
                .ok_or_else(|| AppError::not_found("Ancestor node is missing"))?;
            segments.push(cursor.slug.clone());

            if segments.len() > MAX_PATH_SEGMENTS {
                return Err(AppError::limit(format!(
                    "Path exceeds {MAX_PATH_SEGMENTS} segments; the tree is too deep or contains a parent cycle"
                )));
            }
        }

        segments.reverse();
        Ok(assemble(segments))
    }

    /// Computes the path a child with `slug` would have under `parent_id`.
    ///
    /// Used on create/rename/move, where the child's new slug is known
    /// before any row is written.
    pub async fn compute_child_path(
        &self,
        parent_id: Option<Uuid>,
        slug: &str,
    ) -> AppResult<ComputedPath> {
        let Some(parent_id) = parent_id else {
            return Ok(assemble(vec![slug.to_string()]));
        };

        let parent = self.generate_content_path(parent_id).await?;
        let mut segments = parent.segments;
        segments.push(slug.to_string());

        if segments.len() > MAX_PATH_SEGMENTS {
            return Err(AppError::limit(format!(
                "Path exceeds {MAX_PATH_SEGMENTS} segments; the tree is too deep or contains a parent cycle"
            )));
        }

        Ok(assemble(segments))
    }

    /// Recomputes one node's path and upserts the cache row.
    pub async fn update_materialized_path(&self, content_id: Uuid) -> AppResult<ContentPath> {
        let computed = self.generate_content_path(content_id).await?;
        self.paths
            .upsert(content_id, &computed.path, &computed.segments, computed.depth)
            .await?;
        self.paths
            .find_by_content_id(content_id)
            .await?
            .ok_or_else(|| AppError::internal("Path row vanished after upsert"))
    }

    /// Recomputes the paths of every live descendant of `root_id`,
    /// nearest first. The root itself is the caller's responsibility —
    /// tree writes update it inside their own transaction.
    pub async fn refresh_subtree_paths(&self, root_id: Uuid) -> AppResult<u64> {
        let descendants = self.content.descendant_ids(root_id).await?;
        let mut updated = 0u64;
        for id in descendants {
            self.update_materialized_path(id).await?;
            updated += 1;
        }
        Ok(updated)
    }

    /// Recomputes every live node's path, one at a time.
    ///
    /// O(N·depth) maintenance sweep with no rollback: a failure aborts
    /// the sweep and leaves earlier updates in place. Exposed through the
    /// CLI and the admin surface.
    pub async fn rebuild_all_paths(&self) -> AppResult<u64> {
        let ids = self.content.all_live_ids().await?;
        let total = ids.len();
        let mut rebuilt = 0u64;
        for id in ids {
            self.update_materialized_path(id).await?;
            rebuilt += 1;
        }
        info!(rebuilt, total, "Materialized path rebuild finished");
        Ok(rebuilt)
    }

    /// Resolves a path string to a live node id within one owner's garden.
    pub async fn resolve(&self, owner_id: Uuid, path: &str) -> AppResult<Option<Uuid>> {
        self.paths.resolve(owner_id, path).await
    }

    /// Returns the cached path row for a node, recomputing it if the
    /// cache has no entry.
    pub async fn breadcrumb(&self, content_id: Uuid) -> AppResult<ContentPath> {
        if let Some(existing) = self.paths.find_by_content_id(content_id).await? {
            return Ok(existing);
        }
        self.update_materialized_path(content_id).await
    }
}

fn assemble(segments: Vec<String>) -> ComputedPath {
    ComputedPath {
        path: segments.join("/"),
        depth: segments.len() as i32 - 1,
        segments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assemble_joins_root_first() {
        let computed = assemble(vec![
            "projects".to_string(),
            "web".to_string(),
            "notes".to_string(),
        ]);
        assert_eq!(computed.path, "projects/web/notes");
        assert_eq!(computed.depth, 2);
        assert_eq!(computed.segments.len(), 3);
    }

    #[test]
    fn assemble_single_segment_is_depth_zero() {
        let computed = assemble(vec!["garden".to_string()]);
        assert_eq!(computed.path, "garden");
        assert_eq!(computed.depth, 0);
    }
}
