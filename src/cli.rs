//! Command-line interface definition for boardsync
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands to follow one game, follow several live games,
//! print the game history, and inspect a time control.

use clap::{Parser, Subcommand};

/// boardsync - follow live game records from a remote source
///
/// Polls game records, derives clocks and engine scores per move, and keeps
/// the displayed position on the latest move unless you stepped back.
#[derive(Parser, Debug, Clone)]
#[command(name = "boardsync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for boardsync
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Follow a single game until it ends
    Watch {
        /// Game identifier; defaults to the most recent game in the history
        game_id: Option<String>,

        /// Display name for the game
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Follow the most recent games side by side
    Live {
        /// Override the number of boards from config
        #[arg(short, long)]
        boards: Option<usize>,
    },

    /// Print the game history, oldest first
    History {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the time control encoded in a game identifier
    Clock {
        /// Game identifier
        game_id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            command: Commands::History { json: false },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::History { json: false }));
    }

    #[test]
    fn test_cli_parse_watch_without_id() {
        let cli = Cli::try_parse_from(["boardsync", "watch"]).unwrap();
        if let Commands::Watch { game_id, name } = cli.command {
            assert_eq!(game_id, None);
            assert_eq!(name, None);
        } else {
            panic!("Expected Watch command");
        }
    }

    #[test]
    fn test_cli_parse_watch_with_id_and_name() {
        let cli = Cli::try_parse_from([
            "boardsync",
            "watch",
            "wdoor+floodgate-300-10F+a+b+20230101120000",
            "--name",
            "a vs b",
        ])
        .unwrap();
        if let Commands::Watch { game_id, name } = cli.command {
            assert_eq!(
                game_id.as_deref(),
                Some("wdoor+floodgate-300-10F+a+b+20230101120000")
            );
            assert_eq!(name.as_deref(), Some("a vs b"));
        } else {
            panic!("Expected Watch command");
        }
    }

    #[test]
    fn test_cli_parse_live_boards() {
        let cli = Cli::try_parse_from(["boardsync", "live", "--boards", "2"]).unwrap();
        assert!(matches!(cli.command, Commands::Live { boards: Some(2) }));
    }

    #[test]
    fn test_cli_parse_history_json_and_verbose() {
        let cli = Cli::try_parse_from(["boardsync", "-v", "history", "--json"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::History { json: true }));
    }

    #[test]
    fn test_cli_clock_requires_id() {
        assert!(Cli::try_parse_from(["boardsync", "clock"]).is_err());
    }

    #[test]
    fn test_cli_custom_config_path() {
        let cli =
            Cli::try_parse_from(["boardsync", "--config", "custom.yaml", "history"]).unwrap();
        assert_eq!(cli.config, Some("custom.yaml".to_string()));
    }
}
