//! Audit log entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::action::AuditAction;

/// An immutable audit log entry recording a user action.
///
/// The log is append-only: entries are inserted and searched, never
/// updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLogEntry {
    /// Unique audit entry identifier.
    pub id: Uuid,
    /// The user who performed the action.
    pub actor_id: Uuid,
    /// The action performed, in dotted form (e.g. `"user.create"`).
    pub action: String,
    /// The user the action targeted (if any).
    pub target_user_id: Option<Uuid>,
    /// The content node the action targeted (if any).
    pub target_content_id: Option<Uuid>,
    /// Additional details about the action (JSON).
    pub details: Option<serde_json::Value>,
    /// IP address of the actor.
    pub ip_address: Option<String>,
    /// When the action occurred.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditLogEntry {
    /// The user who performed the action.
    pub actor_id: Uuid,
    /// The action performed.
    pub action: AuditAction,
    /// The user the action targeted.
    pub target_user_id: Option<Uuid>,
    /// The content node the action targeted.
    pub target_content_id: Option<Uuid>,
    /// Additional details.
    pub details: Option<serde_json::Value>,
    /// Actor's IP address.
    pub ip_address: Option<String>,
}
