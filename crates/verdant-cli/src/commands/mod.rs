//! CLI command definitions and dispatch.

pub mod audit;
pub mod migrate;
pub mod paths;
pub mod sessions;
pub mod user;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use verdant_core::error::AppError;

/// Verdant — digital garden backend
#[derive(Debug, Parser)]
#[command(name = "verdant", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment (reads config/default.toml plus
    /// config/{env}.toml when present)
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// User management
    User(user::UserArgs),
    /// Materialized path maintenance
    Paths(paths::PathsArgs),
    /// Session maintenance
    Sessions(sessions::SessionsArgs),
    /// Audit log inspection
    Audit(audit::AuditArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &self.env).await,
            Commands::User(args) => user::execute(args, &self.env, self.format).await,
            Commands::Paths(args) => paths::execute(args, &self.env).await,
            Commands::Sessions(args) => sessions::execute(args, &self.env).await,
            Commands::Audit(args) => audit::execute(args, &self.env, self.format).await,
        }
    }
}

/// Helper: load configuration for the given environment
pub fn load_config(env: &str) -> Result<verdant_core::config::AppConfig, AppError> {
    verdant_core::config::AppConfig::load(env)
}

/// Helper: create database pool from config
pub async fn create_db_pool(
    config: &verdant_core::config::AppConfig,
) -> Result<sqlx::PgPool, AppError> {
    verdant_database::connect_pool(&config.database).await
}
