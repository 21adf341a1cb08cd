//! Materialized path cache entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Cached materialized path for a content node.
///
/// Derived entirely from the `parent_id` chain and the slugs along it;
/// `parent_id` stays authoritative and this row is recomputed (upserted
/// by `content_id`) whenever tree position or a slug changes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContentPath {
    /// The node this path belongs to.
    pub content_id: Uuid,
    /// Slash-joined slugs from root to this node (e.g. `projects/web/notes`).
    pub path: String,
    /// The individual path segments, root first.
    pub segments: Vec<String>,
    /// Number of ancestors (0 for root-level nodes).
    pub depth: i32,
    /// When the path was last recomputed.
    pub updated_at: DateTime<Utc>,
}
