//! boardsync - live game record synchronizer
//!
#![doc = "Main entry point for the boardsync application."]

use std::path::Path;

use anyhow::Result;

use boardsync::cli::{Cli, Commands};
use boardsync::commands;
use boardsync::config::Config;
use boardsync::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    init_logging(&config.logging)?;

    if !Path::new(config_path).exists() {
        tracing::warn!("Config file not found at {}, using defaults", config_path);
    }

    // Execute command
    match cli.command {
        Commands::Watch { game_id, name } => {
            tracing::info!("Starting watch mode");
            commands::watch::run_watch(config, game_id, name).await?;
            Ok(())
        }
        Commands::Live { boards } => {
            tracing::info!("Starting live mode");
            if let Some(n) = boards {
                tracing::debug!("Using board count override: {}", n);
            }
            commands::live::run_live(config, boards).await?;
            Ok(())
        }
        Commands::History { json } => {
            commands::history::handle_history(config, json).await?;
            Ok(())
        }
        Commands::Clock { game_id } => {
            commands::show_clock(&game_id);
            Ok(())
        }
    }
}
