//! Materialized path maintenance commands.

use clap::{Args, Subcommand};

use verdant_core::error::AppError;
use verdant_database::repositories::content::ContentRepository;
use verdant_database::repositories::path::PathRepository;
use verdant_service::PathService;

use crate::output;

/// Arguments for path maintenance commands
#[derive(Debug, Args)]
pub struct PathsArgs {
    /// Paths subcommand
    #[command(subcommand)]
    pub command: PathsCommand,
}

/// Path maintenance subcommands
#[derive(Debug, Subcommand)]
pub enum PathsCommand {
    /// Recompute the materialized path of every live node
    Rebuild,
}

/// Execute path maintenance commands
pub async fn execute(args: &PathsArgs, env: &str) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let pool = super::create_db_pool(&config).await?;

    match &args.command {
        PathsCommand::Rebuild => {
            let service = PathService::new(
                ContentRepository::new(pool.clone()),
                PathRepository::new(pool.clone()),
            );

            println!("Rebuilding materialized paths...");
            let rebuilt = service.rebuild_all_paths().await?;
            output::print_success(&format!("Rebuilt {rebuilt} paths."));
        }
    }

    Ok(())
}
