//! Content tree CRUD: notes, folders, ordering, trash.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use verdant_core::error::AppError;
use verdant_core::result::AppResult;
use verdant_database::repositories::ContentRepository;
use verdant_entity::audit::action::AuditAction;
use verdant_entity::content::model::CreateContentNode;
use verdant_entity::content::{ContentKind, ContentNode, ContentPath};

use crate::audit::AuditService;
use crate::content::outline::{OutlineItem, extract_outline};
use crate::content::path::PathService;
use crate::content::slug::generate_slug;
use crate::context::RequestContext;

/// How many suffixed candidates `generate_unique_slug` tries before
/// giving up.
const MAX_SLUG_ATTEMPTS: u32 = 1000;

/// Slug used when a title contains no sluggable characters.
const FALLBACK_SLUG: &str = "untitled";

/// Request to create a new note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    /// Parent node (None for root level).
    pub parent_id: Option<Uuid>,
    /// Note title.
    pub title: String,
    /// Initial rich-text body.
    pub body: Option<serde_json::Value>,
}

/// Request to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    /// Parent node (None for root level).
    pub parent_id: Option<Uuid>,
    /// Folder title.
    pub title: String,
}

/// Manages the content tree.
///
/// All operations are scoped to the acting user's own garden; admin
/// privileges do not extend to other users' content.
#[derive(Debug, Clone)]
pub struct ContentService {
    content: ContentRepository,
    paths: PathService,
    audit: AuditService,
}

impl ContentService {
    /// Creates a new content service.
    pub fn new(content: ContentRepository, paths: PathService, audit: AuditService) -> Self {
        Self {
            content,
            paths,
            audit,
        }
    }

    /// Creates a note.
    pub async fn create_note(
        &self,
        ctx: &RequestContext,
        req: CreateNoteRequest,
    ) -> AppResult<ContentNode> {
        self.create_node(ctx, req.parent_id, ContentKind::Note, &req.title, req.body)
            .await
    }

    /// Creates a folder.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        req: CreateFolderRequest,
    ) -> AppResult<ContentNode> {
        self.create_node(ctx, req.parent_id, ContentKind::Folder, &req.title, None)
            .await
    }

    /// Shared create path for notes and folders. File nodes are created
    /// through the file service, which also provisions their payload.
    pub(crate) async fn create_node(
        &self,
        ctx: &RequestContext,
        parent_id: Option<Uuid>,
        kind: ContentKind,
        title: &str,
        body: Option<serde_json::Value>,
    ) -> AppResult<ContentNode> {
        ctx.require_writer()?;

        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::validation("Title cannot be empty"));
        }

        if let Some(parent_id) = parent_id {
            let parent = self.owned_live_node(ctx, parent_id).await?;
            if !parent.kind.can_have_children() {
                return Err(AppError::validation("File nodes cannot have children"));
            }
        }

        let slug = self
            .generate_unique_slug(title, ctx.user_id, None)
            .await?;
        let display_order = self.content.next_display_order(ctx.user_id, parent_id).await?;
        let computed = self.paths.compute_child_path(parent_id, &slug).await?;

        let node = self
            .content
            .create(
                &CreateContentNode {
                    owner_id: ctx.user_id,
                    parent_id,
                    kind,
                    title: title.to_string(),
                    slug,
                    display_order,
                    body,
                },
                &computed.path,
                &computed.segments,
                computed.depth,
            )
            .await?;

        info!(
            user_id = %ctx.user_id,
            node_id = %node.id,
            kind = %node.kind,
            path = %computed.path,
            "Content node created"
        );

        Ok(node)
    }

    /// Gets a live node by id.
    pub async fn get_node(&self, ctx: &RequestContext, id: Uuid) -> AppResult<ContentNode> {
        self.owned_live_node(ctx, id).await
    }

    /// Resolves a materialized path to a live node.
    pub async fn get_by_path(&self, ctx: &RequestContext, path: &str) -> AppResult<ContentNode> {
        let id = self
            .paths
            .resolve(ctx.user_id, path)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No content at path '{path}'")))?;
        self.owned_live_node(ctx, id).await
    }

    /// Lists the children of a node, or the garden's roots for `None`,
    /// ordered by display order.
    pub async fn list_children(
        &self,
        ctx: &RequestContext,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<ContentNode>> {
        if let Some(parent_id) = parent_id {
            self.owned_live_node(ctx, parent_id).await?;
        }
        self.content.find_children(ctx.user_id, parent_id).await
    }

    /// Returns a node's breadcrumb: its cached path row, with slugs from
    /// root to the node itself.
    pub async fn breadcrumb(&self, ctx: &RequestContext, id: Uuid) -> AppResult<ContentPath> {
        self.owned_live_node(ctx, id).await?;
        self.paths.breadcrumb(id).await
    }

    /// Extracts the heading outline of a note.
    pub async fn outline(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Vec<OutlineItem>> {
        let node = self.owned_live_node(ctx, id).await?;
        if node.kind != ContentKind::Note {
            return Err(AppError::validation("Only notes have an outline"));
        }
        Ok(node
            .body
            .as_ref()
            .map(extract_outline)
            .unwrap_or_default())
    }

    /// Renames a node. The slug is re-derived from the new title, and
    /// the whole subtree's paths are recomputed.
    pub async fn rename(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        new_title: &str,
    ) -> AppResult<ContentNode> {
        ctx.require_writer()?;

        let node = self.owned_live_node(ctx, id).await?;
        let new_title = new_title.trim();
        if new_title.is_empty() {
            return Err(AppError::validation("Title cannot be empty"));
        }

        let slug = self
            .generate_unique_slug(new_title, ctx.user_id, Some(id))
            .await?;
        let computed = self.paths.compute_child_path(node.parent_id, &slug).await?;

        let renamed = self
            .content
            .rename(id, new_title, &slug, &computed.path, &computed.segments, computed.depth)
            .await?;
        let refreshed = self.paths.refresh_subtree_paths(id).await?;

        info!(
            user_id = %ctx.user_id,
            node_id = %id,
            slug = %renamed.slug,
            descendants_refreshed = refreshed,
            "Content node renamed"
        );

        Ok(renamed)
    }

    /// Replaces a note's rich-text body.
    pub async fn update_body(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        body: serde_json::Value,
    ) -> AppResult<ContentNode> {
        ctx.require_writer()?;

        let node = self.owned_live_node(ctx, id).await?;
        if node.kind != ContentKind::Note {
            return Err(AppError::validation("Only notes have a body"));
        }

        self.content.update_body(id, &body).await
    }

    /// Moves a node under a new parent (or to the root for `None`),
    /// appending it at the end of its new sibling set.
    pub async fn move_node(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        new_parent_id: Option<Uuid>,
    ) -> AppResult<ContentNode> {
        ctx.require_writer()?;

        let node = self.owned_live_node(ctx, id).await?;
        if node.parent_id == new_parent_id {
            return Ok(node);
        }

        if let Some(target_id) = new_parent_id {
            if target_id == id {
                return Err(AppError::validation("Cannot move a node into itself"));
            }
            let target = self.owned_live_node(ctx, target_id).await?;
            if !target.kind.can_have_children() {
                return Err(AppError::validation("File nodes cannot have children"));
            }
            if self.content.is_in_subtree(id, target_id).await? {
                return Err(AppError::validation(
                    "Cannot move a node into its own subtree",
                ));
            }
        }

        let display_order = self
            .content
            .next_display_order(ctx.user_id, new_parent_id)
            .await?;
        let computed = self.paths.compute_child_path(new_parent_id, &node.slug).await?;

        let moved = self
            .content
            .move_node(
                id,
                new_parent_id,
                display_order,
                &computed.path,
                &computed.segments,
                computed.depth,
            )
            .await?;
        let refreshed = self.paths.refresh_subtree_paths(id).await?;

        info!(
            user_id = %ctx.user_id,
            node_id = %id,
            new_parent = ?new_parent_id,
            descendants_refreshed = refreshed,
            "Content node moved"
        );

        Ok(moved)
    }

    /// Sets a node's display order among its siblings.
    ///
    /// If another sibling already holds the target order it is bumped to
    /// this node's old order first. The bump and the write are two
    /// separate statements; two clients reordering the same siblings at
    /// once can leave a duplicate order value, which `repair_order`
    /// renumbers away.
    pub async fn reorder(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        new_order: i32,
    ) -> AppResult<()> {
        ctx.require_writer()?;

        if new_order < 0 {
            return Err(AppError::validation("Display order cannot be negative"));
        }

        let node = self.owned_live_node(ctx, id).await?;
        if node.display_order == new_order {
            return Ok(());
        }

        if let Some(sibling) = self
            .content
            .find_sibling_at_order(ctx.user_id, node.parent_id, new_order, id)
            .await?
        {
            self.content
                .set_display_order(sibling.id, node.display_order)
                .await?;
        }
        self.content.set_display_order(id, new_order).await?;

        info!(
            user_id = %ctx.user_id,
            node_id = %id,
            new_order,
            "Content node reordered"
        );

        Ok(())
    }

    /// Renumbers a sibling set to contiguous 0..N-1. Returns how many
    /// rows moved.
    pub async fn repair_order(
        &self,
        ctx: &RequestContext,
        parent_id: Option<Uuid>,
    ) -> AppResult<u64> {
        ctx.require_writer()?;

        if let Some(parent_id) = parent_id {
            self.owned_live_node(ctx, parent_id).await?;
        }
        let repaired = self
            .content
            .repair_sibling_orders(ctx.user_id, parent_id)
            .await?;
        if repaired > 0 {
            info!(user_id = %ctx.user_id, parent = ?parent_id, repaired, "Sibling orders repaired");
        }
        Ok(repaired)
    }

    /// Soft-deletes a node and its whole subtree. Returns how many nodes
    /// went to the trash.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> AppResult<u64> {
        ctx.require_writer()?;

        self.owned_live_node(ctx, id).await?;
        let deleted = self.content.soft_delete_subtree(id).await?;

        self.audit
            .record(
                ctx,
                AuditAction::ContentDelete,
                None,
                Some(id),
                Some(serde_json::json!({ "nodes": deleted })),
            )
            .await?;
        info!(user_id = %ctx.user_id, node_id = %id, deleted, "Content subtree trashed");

        Ok(deleted)
    }

    /// Restores a trashed node together with the descendants that were
    /// trashed in the same deletion.
    pub async fn restore(&self, ctx: &RequestContext, id: Uuid) -> AppResult<u64> {
        ctx.require_writer()?;

        let node = self
            .content
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Content node not found"))?;
        self.ensure_owned(ctx, &node)?;
        if node.deleted_at.is_none() {
            return Err(AppError::validation("Node is not in the trash"));
        }

        if let Some(parent_id) = node.parent_id {
            let parent = self
                .content
                .find_live_by_id(parent_id)
                .await?;
            if parent.is_none() {
                return Err(AppError::validation(
                    "Cannot restore under a deleted parent; restore the parent first",
                ));
            }
        }

        let restored = self.content.restore_subtree(id).await?;
        self.paths.update_materialized_path(id).await?;
        self.paths.refresh_subtree_paths(id).await?;

        self.audit
            .record(
                ctx,
                AuditAction::ContentRestore,
                None,
                Some(id),
                Some(serde_json::json!({ "nodes": restored })),
            )
            .await?;
        info!(user_id = %ctx.user_id, node_id = %id, restored, "Content subtree restored");

        Ok(restored)
    }

    /// Lists the owner's trashed nodes, most recently deleted first.
    pub async fn list_trash(&self, ctx: &RequestContext) -> AppResult<Vec<ContentNode>> {
        self.content.find_deleted(ctx.user_id).await
    }

    /// Rebuilds every materialized path from the parent chains.
    ///
    /// Recovery tool for administrators; the path cache is normally kept
    /// current by every mutation.
    pub async fn rebuild_paths(&self, ctx: &RequestContext) -> AppResult<u64> {
        ctx.require_admin()?;

        let rebuilt = self.paths.rebuild_all_paths().await?;
        self.audit
            .record(
                ctx,
                AuditAction::PathsRebuild,
                None,
                None,
                Some(serde_json::json!({ "rebuilt": rebuilt })),
            )
            .await?;
        info!(admin_id = %ctx.user_id, rebuilt, "Materialized paths rebuilt");

        Ok(rebuilt)
    }

    /// Finds a unique slug for `title` within one owner's garden.
    ///
    /// Starts from the derived base slug and appends `-2`, `-3`, … while
    /// the candidate collides with any node (trashed ones included, so a
    /// restore never collides). Errors with `Limit` after
    /// [`MAX_SLUG_ATTEMPTS`] candidates.
    pub async fn generate_unique_slug(
        &self,
        title: &str,
        owner_id: Uuid,
        exclude_id: Option<Uuid>,
    ) -> AppResult<String> {
        let base = generate_slug(title);
        let base = if base.is_empty() {
            FALLBACK_SLUG.to_string()
        } else {
            base
        };

        if !self.content.slug_exists(owner_id, &base, exclude_id).await? {
            return Ok(base);
        }

        for n in 2..=MAX_SLUG_ATTEMPTS {
            let candidate = format!("{base}-{n}");
            if !self
                .content
                .slug_exists(owner_id, &candidate, exclude_id)
                .await?
            {
                return Ok(candidate);
            }
        }

        Err(AppError::limit(format!(
            "Could not find a unique slug for '{base}' after {MAX_SLUG_ATTEMPTS} attempts"
        )))
    }

    /// Fetches a live node and checks it belongs to the acting user.
    pub(crate) async fn owned_live_node(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> AppResult<ContentNode> {
        let node = self
            .content
            .find_live_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Content node not found"))?;
        self.ensure_owned(ctx, &node)?;
        Ok(node)
    }

    fn ensure_owned(&self, ctx: &RequestContext, node: &ContentNode) -> AppResult<()> {
        if node.owner_id != ctx.user_id {
            return Err(AppError::forbidden("You do not own this content"));
        }
        Ok(())
    }
}
