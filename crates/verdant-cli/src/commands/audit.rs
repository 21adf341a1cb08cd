//! Audit log CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use verdant_core::error::AppError;
use verdant_core::types::pagination::PageRequest;
use verdant_database::repositories::audit::{AuditLogRepository, AuditSearchFilter};
use verdant_entity::audit::model::AuditLogEntry;

use crate::output::{self, OutputFormat};

/// Arguments for audit commands
#[derive(Debug, Args)]
pub struct AuditArgs {
    /// Audit subcommand
    #[command(subcommand)]
    pub command: AuditCommand,
}

/// Audit subcommands
#[derive(Debug, Subcommand)]
pub enum AuditCommand {
    /// Show the most recent audit entries
    Recent {
        /// Number of entries
        #[arg(short, long, default_value = "50")]
        limit: i64,
    },
    /// Search the audit log
    Search {
        /// Filter by action (e.g. auth.login)
        #[arg(short, long)]
        action: Option<String>,
        /// Filter by actor (user ID)
        #[arg(long)]
        actor: Option<String>,
        /// Number of results
        #[arg(short, long, default_value = "50")]
        limit: u64,
    },
}

/// Audit display row
#[derive(Debug, Serialize, Tabled)]
struct AuditRow {
    /// Time
    time: String,
    /// Actor ID
    actor: String,
    /// Action
    action: String,
    /// IP
    ip: String,
}

impl From<&AuditLogEntry> for AuditRow {
    fn from(e: &AuditLogEntry) -> Self {
        Self {
            time: e.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            actor: e.actor_id.to_string(),
            action: e.action.clone(),
            ip: e.ip_address.clone().unwrap_or_default(),
        }
    }
}

/// Execute audit commands
pub async fn execute(args: &AuditArgs, env: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let pool = super::create_db_pool(&config).await?;
    let audit_repo = AuditLogRepository::new(pool.clone());

    match &args.command {
        AuditCommand::Recent { limit } => {
            let entries = audit_repo.find_recent(*limit).await?;

            let rows: Vec<AuditRow> = entries.iter().map(AuditRow::from).collect();
            output::print_list(&rows, format);
        }
        AuditCommand::Search {
            action,
            actor,
            limit,
        } => {
            let actor_id = actor
                .as_ref()
                .map(|a| {
                    uuid::Uuid::parse_str(a)
                        .map_err(|e| AppError::validation(format!("Invalid actor ID: {e}")))
                })
                .transpose()?;

            let filter = AuditSearchFilter {
                actor_id,
                action: action.clone(),
                ..Default::default()
            };

            let page = PageRequest::new(1, *limit);
            let response = audit_repo.search(&filter, &page).await?;

            let rows: Vec<AuditRow> = response.items.iter().map(AuditRow::from).collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}
