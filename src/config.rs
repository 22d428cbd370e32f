//! Configuration management for boardsync
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{BoardsyncError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder substituted with the game id in URL templates
pub const GAME_ID_PLACEHOLDER: &str = "{game_id}";

/// Main configuration structure for boardsync
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where records and the game list are fetched from
    #[serde(default)]
    pub source: SourceConfig,
    /// Poll timing and multi-board settings
    #[serde(default)]
    pub polling: PollingConfig,
    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote source configuration
///
/// URL templates use `{game_id}` as the placeholder for the game identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Template of the record URL, e.g. `https://example.org/{game_id}.csa`
    #[serde(default)]
    pub record_url: Option<String>,

    /// URL of the game list log
    #[serde(default)]
    pub list_url: Option<String>,

    /// Template of the public page of a game, shown next to the board
    #[serde(default)]
    pub canonical_url: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum accepted size of a fetched record or list (bytes)
    #[serde(default = "default_max_record_bytes")]
    pub max_record_bytes: usize,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_record_bytes() -> usize {
    5 * 1024 * 1024 // 5 MB
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            record_url: None,
            list_url: None,
            canonical_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            max_record_bytes: default_max_record_bytes(),
        }
    }
}

/// Poll timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Minimum spacing of non-forced fetches for one game (milliseconds)
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,

    /// Delay before the next poll or retry (milliseconds)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Games started further than this from the most recent one are dropped
    /// from the multi-board list (milliseconds)
    #[serde(default = "default_window_span_ms")]
    pub window_span_ms: u64,

    /// Interval between game list refreshes in multi-board mode (milliseconds)
    #[serde(default = "default_list_refresh_ms")]
    pub list_refresh_ms: u64,

    /// Maximum number of boards followed at once in multi-board mode
    #[serde(default = "default_max_boards")]
    pub max_boards: usize,
}

fn default_throttle_ms() -> u64 {
    8_500
}

fn default_retry_delay_ms() -> u64 {
    10_000
}

fn default_window_span_ms() -> u64 {
    2_400_000 // 40 minutes
}

fn default_list_refresh_ms() -> u64 {
    60_000
}

fn default_max_boards() -> usize {
    4
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            throttle_ms: default_throttle_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            window_span_ms: default_window_span_ms(),
            list_refresh_ms: default_list_refresh_ms(),
            max_boards: default_max_boards(),
        }
    }
}

impl PollingConfig {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn list_refresh(&self) -> Duration {
        Duration::from_millis(self.list_refresh_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Enable JSON-formatted logs
    #[serde(default)]
    pub json_format: bool,

    /// Log file path (if None, STDERR only)
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| BoardsyncError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| BoardsyncError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("BOARDSYNC_RECORD_URL") {
            tracing::debug!(record_url = %url, "Env override: BOARDSYNC_RECORD_URL");
            self.source.record_url = Some(url);
        }

        if let Ok(url) = std::env::var("BOARDSYNC_LIST_URL") {
            tracing::debug!(list_url = %url, "Env override: BOARDSYNC_LIST_URL");
            self.source.list_url = Some(url);
        }

        if let Ok(url) = std::env::var("BOARDSYNC_CANONICAL_URL") {
            tracing::debug!(canonical_url = %url, "Env override: BOARDSYNC_CANONICAL_URL");
            self.source.canonical_url = Some(url);
        }

        override_number("BOARDSYNC_THROTTLE_MS", &mut self.polling.throttle_ms);
        override_number("BOARDSYNC_RETRY_DELAY_MS", &mut self.polling.retry_delay_ms);
        override_number("BOARDSYNC_WINDOW_SPAN_MS", &mut self.polling.window_span_ms);
        override_number("BOARDSYNC_MAX_BOARDS", &mut self.polling.max_boards);

        if let Ok(level) = std::env::var("BOARDSYNC_LOG_LEVEL") {
            tracing::debug!(level = %level, "Env override: BOARDSYNC_LOG_LEVEL");
            self.logging.level = level;
        }

        if let Ok(json_logs) = std::env::var("BOARDSYNC_JSON_LOGS") {
            match json_logs.parse::<bool>() {
                Ok(v) => {
                    self.logging.json_format = v;
                    tracing::debug!(json_logs = v, "Env override: BOARDSYNC_JSON_LOGS");
                }
                Err(_) => {
                    tracing::warn!("Invalid value for BOARDSYNC_JSON_LOGS: {}", json_logs);
                }
            }
        }

        if let Ok(log_file) = std::env::var("BOARDSYNC_LOG_FILE") {
            tracing::debug!(log_file = %log_file, "Env override: BOARDSYNC_LOG_FILE");
            self.logging.file_path = Some(PathBuf::from(log_file));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            self.logging.level = "debug".to_string();
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all timing values are positive and that configured URL
    /// templates are usable.
    ///
    /// # Errors
    ///
    /// Returns `BoardsyncError::Config` describing the first failed check
    pub fn validate(&self) -> Result<()> {
        validate_template("source.record_url", self.source.record_url.as_deref(), true)?;
        validate_template("source.list_url", self.source.list_url.as_deref(), false)?;
        validate_template(
            "source.canonical_url",
            self.source.canonical_url.as_deref(),
            true,
        )?;

        let positive = [
            ("polling.throttle_ms", self.polling.throttle_ms),
            ("polling.retry_delay_ms", self.polling.retry_delay_ms),
            ("polling.window_span_ms", self.polling.window_span_ms),
            ("polling.list_refresh_ms", self.polling.list_refresh_ms),
            ("source.request_timeout_secs", self.source.request_timeout_secs),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(
                    BoardsyncError::Config(format!("{} must be greater than 0", name)).into(),
                );
            }
        }

        if self.polling.max_boards == 0 {
            return Err(BoardsyncError::Config(
                "polling.max_boards must be greater than 0".to_string(),
            )
            .into());
        }

        if self.source.max_record_bytes == 0 {
            return Err(BoardsyncError::Config(
                "source.max_record_bytes must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Record URL for a game
    ///
    /// # Errors
    ///
    /// Returns `BoardsyncError::Config` when no record URL is configured
    pub fn record_url(&self, game_id: &str) -> Result<String> {
        let template = self.source.record_url.as_deref().ok_or_else(|| {
            BoardsyncError::Config("source.record_url is not configured".to_string())
        })?;
        Ok(fill_template(template, game_id))
    }

    /// List URL
    ///
    /// # Errors
    ///
    /// Returns `BoardsyncError::Config` when no list URL is configured
    pub fn list_url(&self) -> Result<String> {
        self.source.list_url.clone().ok_or_else(|| {
            BoardsyncError::Config("source.list_url is not configured".to_string()).into()
        })
    }
}

/// Substitute `game_id` into a URL template
pub fn fill_template(template: &str, game_id: &str) -> String {
    template.replace(GAME_ID_PLACEHOLDER, game_id)
}

fn validate_template(name: &str, template: Option<&str>, needs_placeholder: bool) -> Result<()> {
    let Some(template) = template else {
        return Ok(());
    };

    if needs_placeholder && !template.contains(GAME_ID_PLACEHOLDER) {
        return Err(BoardsyncError::Config(format!(
            "{} must contain the {} placeholder",
            name, GAME_ID_PLACEHOLDER
        ))
        .into());
    }

    let sample = fill_template(template, "game");
    let parsed = url::Url::parse(&sample)
        .map_err(|e| BoardsyncError::Config(format!("{} is not a valid URL: {}", name, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(BoardsyncError::Config(format!(
            "{} has unsupported scheme: {}",
            name, other
        ))
        .into()),
    }
}

fn override_number<T>(var: &str, target: &mut T)
where
    T: std::str::FromStr + std::fmt::Display,
{
    if let Ok(raw) = std::env::var(var) {
        match raw.parse::<T>() {
            Ok(value) => {
                tracing::debug!(value = %value, "Env override: {}", var);
                *target = value;
            }
            Err(_) => tracing::warn!("Invalid value for {}: {}", var, raw),
        }
    }
}
