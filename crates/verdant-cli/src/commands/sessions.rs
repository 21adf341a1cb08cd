//! Session maintenance commands.

use clap::{Args, Subcommand};

use verdant_auth::SessionCleanup;
use verdant_core::error::AppError;
use verdant_database::repositories::session::SessionRepository;

use crate::output;

/// Arguments for session maintenance commands
#[derive(Debug, Args)]
pub struct SessionsArgs {
    /// Sessions subcommand
    #[command(subcommand)]
    pub command: SessionsCommand,
}

/// Session maintenance subcommands
#[derive(Debug, Subcommand)]
pub enum SessionsCommand {
    /// Delete sessions past their absolute expiry
    Cleanup,
}

/// Execute session maintenance commands
pub async fn execute(args: &SessionsArgs, env: &str) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let pool = super::create_db_pool(&config).await?;

    match &args.command {
        SessionsCommand::Cleanup => {
            let cleanup = SessionCleanup::new(SessionRepository::new(pool.clone()));
            let deleted = cleanup.run_cleanup().await?;
            output::print_success(&format!("Removed {deleted} expired sessions."));
        }
    }

    Ok(())
}
