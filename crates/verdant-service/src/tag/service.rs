//! Tag management.
//!
//! Tags are owner-scoped names created implicitly on first use. A node's
//! tag set is always replaced wholesale: the editor re-extracts tags
//! from the note body on save and sends the complete set, occurrence
//! positions included.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use verdant_core::error::AppError;
use verdant_core::result::AppResult;
use verdant_database::repositories::TagRepository;
use verdant_entity::content::ContentNode;
use verdant_entity::tag::{Tag, TagPosition, TagWithCount};

use crate::content::ContentService;
use crate::context::RequestContext;

/// Longest accepted tag name.
const MAX_TAG_NAME_LENGTH: usize = 100;

/// One tag to attach, with where it occurs in the note body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagInput {
    /// Tag name; normalized to lowercase.
    pub name: String,
    /// Occurrence offsets within the note body.
    #[serde(default)]
    pub positions: Vec<TagPosition>,
}

/// A tag attached to a node, with its occurrence positions.
#[derive(Debug, Clone, Serialize)]
pub struct AttachedTag {
    /// The tag.
    pub tag: Tag,
    /// Where it occurs in the note body.
    pub positions: Vec<TagPosition>,
}

/// Manages tags within one owner's garden.
#[derive(Debug, Clone)]
pub struct TagService {
    tags: TagRepository,
    content: ContentService,
}

impl TagService {
    /// Creates a new tag service.
    pub fn new(tags: TagRepository, content: ContentService) -> Self {
        Self { tags, content }
    }

    /// Replaces a node's tag set.
    ///
    /// Names are trimmed, lowercased, and deduplicated; empty names are
    /// dropped. Tags left unused anywhere in the garden afterwards are
    /// removed.
    pub async fn set_tags(
        &self,
        ctx: &RequestContext,
        content_id: Uuid,
        inputs: Vec<TagInput>,
    ) -> AppResult<Vec<Tag>> {
        ctx.require_writer()?;
        self.content.owned_live_node(ctx, content_id).await?;

        let mut seen = HashSet::new();
        let mut attachments = Vec::new();
        let mut applied = Vec::new();
        for input in &inputs {
            let name = input.name.trim().to_lowercase();
            if name.is_empty() || !seen.insert(name.clone()) {
                continue;
            }
            if name.len() > MAX_TAG_NAME_LENGTH {
                return Err(AppError::validation(format!(
                    "Tag name exceeds {MAX_TAG_NAME_LENGTH} characters"
                )));
            }

            let tag = self.tags.upsert(ctx.user_id, &name).await?;
            let positions = serde_json::to_value(&input.positions)?;
            attachments.push((tag.id, positions));
            applied.push(tag);
        }

        self.tags
            .replace_content_tags(content_id, &attachments)
            .await?;
        let pruned = self.tags.delete_orphans(ctx.user_id).await?;

        info!(
            user_id = %ctx.user_id,
            node_id = %content_id,
            tags = applied.len(),
            pruned,
            "Tags replaced"
        );

        Ok(applied)
    }

    /// The owner's tags with live usage counts.
    pub async fn list_tags(&self, ctx: &RequestContext) -> AppResult<Vec<TagWithCount>> {
        self.tags.list_with_counts(ctx.user_id).await
    }

    /// Live nodes carrying a tag.
    pub async fn nodes_for_tag(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> AppResult<Vec<ContentNode>> {
        let name = name.trim().to_lowercase();
        self.tags.find_nodes_by_tag(ctx.user_id, &name).await
    }

    /// A node's tags with their occurrence positions.
    pub async fn tags_for_node(
        &self,
        ctx: &RequestContext,
        content_id: Uuid,
    ) -> AppResult<Vec<AttachedTag>> {
        self.content.owned_live_node(ctx, content_id).await?;

        let tags = self.tags.find_tags_for_content(content_id).await?;
        let attachments = self.tags.find_attachments(content_id).await?;

        Ok(tags
            .into_iter()
            .map(|tag| {
                let positions = attachments
                    .iter()
                    .find(|a| a.tag_id == tag.id)
                    .and_then(|a| serde_json::from_value(a.positions.clone()).ok())
                    .unwrap_or_default();
                AttachedTag { tag, positions }
            })
            .collect())
    }
}
