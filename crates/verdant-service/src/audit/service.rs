//! Audit log writing, searching, and dashboard counters.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use verdant_core::result::AppResult;
use verdant_core::types::pagination::{PageRequest, PageResponse};
use verdant_database::repositories::{AuditLogRepository, AuditSearchFilter};
use verdant_entity::audit::AuditLogEntry;
use verdant_entity::audit::action::AuditAction;
use verdant_entity::audit::model::CreateAuditLogEntry;

use crate::context::RequestContext;

/// Activity counters shown on the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditDashboard {
    /// Successful logins in the last 24 hours.
    pub logins_24h: u64,
    /// Failed login attempts in the last 24 hours.
    pub failed_logins_24h: u64,
    /// Content deletions in the last 7 days.
    pub content_deletes_7d: u64,
    /// Vault exports in the last 7 days.
    pub vault_exports_7d: u64,
}

/// Append-only audit trail service.
#[derive(Debug, Clone)]
pub struct AuditService {
    audit: AuditLogRepository,
}

impl AuditService {
    /// Creates a new audit service.
    pub fn new(audit: AuditLogRepository) -> Self {
        Self { audit }
    }

    /// Records an action performed by the current request's user.
    ///
    /// The actor and IP come from the request context; targets and
    /// details are per-action.
    pub async fn record(
        &self,
        ctx: &RequestContext,
        action: AuditAction,
        target_user_id: Option<Uuid>,
        target_content_id: Option<Uuid>,
        details: Option<serde_json::Value>,
    ) -> AppResult<AuditLogEntry> {
        self.audit
            .create(&CreateAuditLogEntry {
                actor_id: ctx.user_id,
                action,
                target_user_id,
                target_content_id,
                details,
                ip_address: Some(ctx.ip_address.clone()),
            })
            .await
    }

    /// Records an action outside a normal request context (login paths,
    /// where no session exists yet).
    pub async fn record_for_actor(
        &self,
        actor_id: Uuid,
        action: AuditAction,
        ip_address: Option<String>,
        details: Option<serde_json::Value>,
    ) -> AppResult<AuditLogEntry> {
        self.audit
            .create(&CreateAuditLogEntry {
                actor_id,
                action,
                target_user_id: None,
                target_content_id: None,
                details,
                ip_address,
            })
            .await
    }

    /// Searches the audit log with optional filters.
    pub async fn search(
        &self,
        filter: &AuditSearchFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AuditLogEntry>> {
        self.audit.search(filter, page).await
    }

    /// Returns the most recent entries, newest first.
    pub async fn recent(&self, limit: i64) -> AppResult<Vec<AuditLogEntry>> {
        self.audit.find_recent(limit).await
    }

    /// Computes the admin dashboard activity counters.
    pub async fn dashboard(&self) -> AppResult<AuditDashboard> {
        let now = Utc::now();
        let day_ago = now - Duration::hours(24);
        let week_ago = now - Duration::days(7);

        Ok(AuditDashboard {
            logins_24h: self
                .audit
                .count_actions_since(AuditAction::Login.as_str(), day_ago)
                .await? as u64,
            failed_logins_24h: self
                .audit
                .count_actions_since(AuditAction::LoginFailed.as_str(), day_ago)
                .await? as u64,
            content_deletes_7d: self
                .audit
                .count_actions_since(AuditAction::ContentDelete.as_str(), week_ago)
                .await? as u64,
            vault_exports_7d: self
                .audit
                .count_actions_since(AuditAction::VaultExport.as_str(), week_ago)
                .await? as u64,
        })
    }
}
