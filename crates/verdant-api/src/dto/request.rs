//! Request DTOs with validation.
//!
//! Bodies that map one-to-one onto a service request type (note and
//! folder creation, uploads, profile updates) are deserialized straight
//! into that type by the handlers; this module holds the API-only shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use verdant_entity::user::{UserRole, UserStatus};
use verdant_service::tag::TagInput;

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username.
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token refresh request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token.
    pub refresh_token: String,
}

/// Rename request for a content node.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenameRequest {
    /// New title.
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
}

/// Note body replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBodyRequest {
    /// The full rich-text document.
    pub body: serde_json::Value,
}

/// Move a node to a new parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    /// New parent node, `null` for root level.
    pub parent_id: Option<Uuid>,
}

/// Reposition a node among its siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderRequest {
    /// Target position, 0-based.
    pub display_order: i32,
}

/// Replace the tag set of a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetTagsRequest {
    /// The full desired tag set; tags left out are detached.
    pub tags: Vec<TagInput>,
}

/// Role change request (admin).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRoleRequest {
    /// New role.
    pub role: UserRole,
}

/// Status change request (admin).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeStatusRequest {
    /// New status.
    pub status: UserStatus,
}

/// Session termination request (admin).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminateSessionRequest {
    /// Reason recorded in the audit trail.
    pub reason: Option<String>,
}

/// Query for resolving a node by its materialized path.
#[derive(Debug, Clone, Deserialize)]
pub struct ByPathQuery {
    /// Slash-separated slug path, e.g. `garden/ferns`.
    pub path: String,
}

/// Query selecting a sibling group.
#[derive(Debug, Clone, Deserialize)]
pub struct SiblingQuery {
    /// Parent node, absent for the root level.
    pub parent_id: Option<Uuid>,
}

/// Query carrying an upload proxy token.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyQuery {
    /// Opaque upload token from the upload credential.
    pub token: String,
}

/// Admin user listing query.
#[derive(Debug, Clone, Deserialize)]
pub struct UserSearchQuery {
    /// Optional username/email/display-name search term.
    pub q: Option<String>,
}

/// Audit log search query (admin).
#[derive(Debug, Clone, Deserialize)]
pub struct AuditSearchQuery {
    /// Restrict to entries recorded by this actor.
    pub actor_id: Option<Uuid>,
    /// Restrict to an exact action string, e.g. `auth.login`.
    pub action: Option<String>,
    /// Restrict to entries about this user.
    pub target_user_id: Option<Uuid>,
    /// Restrict to entries about this content node.
    pub target_content_id: Option<Uuid>,
    /// Only entries at or after this instant (RFC 3339).
    pub from: Option<DateTime<Utc>>,
    /// Only entries before this instant (RFC 3339).
    pub to: Option<DateTime<Utc>>,
}

/// Query bounding the recent-activity listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RecentQuery {
    /// Maximum number of entries to return.
    pub limit: Option<i64>,
}
