//! Content node entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::ContentKind;

/// A node in a user's content tree.
///
/// The tree structure is authoritative through `parent_id`; the cached
/// materialized path lives in [`super::path::ContentPath`]. Slugs are
/// unique per owner across the whole garden, not per sibling set.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContentNode {
    /// Unique node identifier.
    pub id: Uuid,
    /// The user whose garden this node belongs to.
    pub owner_id: Uuid,
    /// Parent node ID (null for root-level nodes).
    pub parent_id: Option<Uuid>,
    /// Node kind.
    pub kind: ContentKind,
    /// Human-readable title.
    pub title: String,
    /// URL-safe slug, unique per owner.
    pub slug: String,
    /// Position among siblings (0-based; kept contiguous by a repair
    /// utility, not enforced transactionally).
    pub display_order: i32,
    /// Rich-text document body (notes only).
    pub body: Option<serde_json::Value>,
    /// When the node was created.
    pub created_at: DateTime<Utc>,
    /// When the node was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete timestamp; null for live nodes.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ContentNode {
    /// Check if this node sits at the root of its owner's garden.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check if this node has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Data required to create a new content node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContentNode {
    /// The owning user.
    pub owner_id: Uuid,
    /// Parent node (None for root level).
    pub parent_id: Option<Uuid>,
    /// Node kind.
    pub kind: ContentKind,
    /// Human-readable title.
    pub title: String,
    /// Pre-resolved unique slug.
    pub slug: String,
    /// Position among siblings.
    pub display_order: i32,
    /// Rich-text body (notes only).
    pub body: Option<serde_json::Value>,
}

/// Data for updating an existing node's editable fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateContentNode {
    /// The node ID to update.
    pub id: Uuid,
    /// New title (also re-slugs the node).
    pub title: Option<String>,
    /// New rich-text body.
    pub body: Option<serde_json::Value>,
}
