//! Audit log repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use verdant_core::error::{AppError, ErrorKind};
use verdant_core::result::AppResult;
use verdant_core::types::pagination::{PageRequest, PageResponse};
use verdant_entity::audit::model::{AuditLogEntry, CreateAuditLogEntry};

/// Filter criteria for searching the audit log. Unset fields match
/// everything.
#[derive(Debug, Clone, Default)]
pub struct AuditSearchFilter {
    /// Restrict to entries recorded by this actor.
    pub actor_id: Option<Uuid>,
    /// Restrict to an exact action string, e.g. `auth.login`.
    pub action: Option<String>,
    /// Restrict to entries about this user.
    pub target_user_id: Option<Uuid>,
    /// Restrict to entries about this content node.
    pub target_content_id: Option<Uuid>,
    /// Only entries recorded at or after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Only entries recorded before this instant.
    pub to: Option<DateTime<Utc>>,
}

/// Repository for the append-only audit log.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

impl AuditLogRepository {
    /// Create a new audit log repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append one entry. The action enum is stored as its dotted string
    /// form.
    pub async fn create(&self, data: &CreateAuditLogEntry) -> AppResult<AuditLogEntry> {
        sqlx::query_as::<_, AuditLogEntry>(
            "INSERT INTO audit_log \
               (actor_id, action, target_user_id, target_content_id, details, ip_address) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(data.actor_id)
        .bind(data.action.as_str())
        .bind(data.target_user_id)
        .bind(data.target_content_id)
        .bind(&data.details)
        .bind(&data.ip_address)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create audit entry", e))
    }

    /// Search the log with optional filters, newest first.
    pub async fn search(
        &self,
        filter: &AuditSearchFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AuditLogEntry>> {
        let mut conditions = Vec::new();
        let mut param_idx = 1u32;

        if filter.actor_id.is_some() {
            conditions.push(format!("actor_id = ${param_idx}"));
            param_idx += 1;
        }
        if filter.action.is_some() {
            conditions.push(format!("action = ${param_idx}"));
            param_idx += 1;
        }
        if filter.target_user_id.is_some() {
            conditions.push(format!("target_user_id = ${param_idx}"));
            param_idx += 1;
        }
        if filter.target_content_id.is_some() {
            conditions.push(format!("target_content_id = ${param_idx}"));
            param_idx += 1;
        }
        if filter.from.is_some() {
            conditions.push(format!("created_at >= ${param_idx}"));
            param_idx += 1;
        }
        if filter.to.is_some() {
            conditions.push(format!("created_at < ${param_idx}"));
            param_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM audit_log {where_clause}");
        let select_sql = format!(
            "SELECT * FROM audit_log {where_clause} ORDER BY created_at DESC LIMIT ${param_idx} OFFSET ${}",
            param_idx + 1
        );

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        let mut select_query = sqlx::query_as::<_, AuditLogEntry>(&select_sql);

        if let Some(actor_id) = filter.actor_id {
            count_query = count_query.bind(actor_id);
            select_query = select_query.bind(actor_id);
        }
        if let Some(ref action) = filter.action {
            count_query = count_query.bind(action.clone());
            select_query = select_query.bind(action.clone());
        }
        if let Some(target_user_id) = filter.target_user_id {
            count_query = count_query.bind(target_user_id);
            select_query = select_query.bind(target_user_id);
        }
        if let Some(target_content_id) = filter.target_content_id {
            count_query = count_query.bind(target_content_id);
            select_query = select_query.bind(target_content_id);
        }
        if let Some(from) = filter.from {
            count_query = count_query.bind(from);
            select_query = select_query.bind(from);
        }
        if let Some(to) = filter.to {
            count_query = count_query.bind(to);
            select_query = select_query.bind(to);
        }

        let total = count_query.fetch_one(&self.pool).await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count audit entries", e)
        })?;

        let entries = select_query
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to search audit log", e)
            })?;

        Ok(PageResponse::new(
            entries,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// Most recent entries across the whole log.
    pub async fn find_recent(&self, limit: i64) -> AppResult<Vec<AuditLogEntry>> {
        sqlx::query_as::<_, AuditLogEntry>(
            "SELECT * FROM audit_log ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list audit entries", e))
    }

    /// Count occurrences of one action since an instant. Used by the
    /// admin dashboard counters.
    pub async fn count_actions_since(
        &self,
        action: &str,
        since: DateTime<Utc>,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM audit_log WHERE action = $1 AND created_at >= $2",
        )
        .bind(action)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count audit actions", e)
        })?;
        Ok(count)
    }
}
