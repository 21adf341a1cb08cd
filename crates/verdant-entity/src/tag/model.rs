//! Tag entity models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A tag name scoped to one owner's garden.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    /// Unique tag identifier.
    pub id: Uuid,
    /// The owning user.
    pub owner_id: Uuid,
    /// Tag name, unique per owner.
    pub name: String,
    /// When the tag was first used.
    pub created_at: DateTime<Utc>,
}

/// The association between a content node and a tag.
///
/// `positions` records where in the note body each occurrence of the tag
/// appears, as a JSON array of `{start, end}` character offsets, so the
/// editor can highlight them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContentTag {
    /// The tagged content node.
    pub content_id: Uuid,
    /// The applied tag.
    pub tag_id: Uuid,
    /// Occurrence offsets within the note body (JSON array).
    pub positions: serde_json::Value,
    /// When the association was created.
    pub created_at: DateTime<Utc>,
}

/// One occurrence of a tag within a note body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPosition {
    /// Character offset where the occurrence starts.
    pub start: u32,
    /// Character offset just past the occurrence.
    pub end: u32,
}

/// A tag together with how many live nodes carry it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TagWithCount {
    /// Unique tag identifier.
    pub id: Uuid,
    /// Tag name.
    pub name: String,
    /// Number of live content nodes tagged with it.
    pub content_count: i64,
}
