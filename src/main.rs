//! Verdant Server — digital garden backend.
//!
//! Main entry point that loads configuration, connects the database,
//! and starts the HTTP server.

use tracing_subscriber::{EnvFilter, fmt};

use verdant_core::config::AppConfig;
use verdant_core::error::AppError;
use verdant_database::connect_pool;
use verdant_database::migration::run_migrations;

#[tokio::main]
async fn main() {
    let env = std::env::var("VERDANT_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Verdant v{}", env!("CARGO_PKG_VERSION"));

    let pool = connect_pool(&config.database).await?;
    run_migrations(&pool).await?;

    verdant_api::run_server(config, pool).await
}
