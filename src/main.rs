use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog::cli::{Cli, Commands};
use catalog::config::Config;
use catalog::startup;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting catalog v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Api => startup::run_api(&config).await,
        Commands::Web => startup::run_web(&config).await,
        Commands::All => startup::run_all(&config).await,
        Commands::Check => {
            tracing::info!(
                api = %config.api_addr(),
                web = %config.web_addr(),
                database = %config.database.url,
                "Configuration is valid"
            );
            Ok(())
        }
    }
}
