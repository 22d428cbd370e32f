//! Error types for boardsync
//!
//! This module defines the error types used throughout the crate,
//! using `thiserror` for ergonomic error handling.
//!
//! `Network` and `ContentParse` failures are produced by the record source
//! and the record reader. While a game is followed the fetch scheduler absorbs
//! them into a scheduled retry; one-shot commands such as `history` report
//! them directly.

use thiserror::Error;

/// Main error type for boardsync operations
#[derive(Error, Debug)]
pub enum BoardsyncError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote source could not be reached or answered with a failure status
    #[error("Network error: {0}")]
    Network(String),

    /// Fetched content could not be read as a game record or list
    #[error("Content parse error: {0}")]
    ContentParse(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for boardsync operations
///
/// Uses `anyhow::Error` as the error type so callers can attach context
/// while still downcasting to [`BoardsyncError`] where it matters.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = BoardsyncError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_network_error_display() {
        let error = BoardsyncError::Network("HTTP 503".to_string());
        assert_eq!(error.to_string(), "Network error: HTTP 503");
    }

    #[test]
    fn test_content_parse_error_display() {
        let error = BoardsyncError::ContentParse("empty record".to_string());
        assert_eq!(error.to_string(), "Content parse error: empty record");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: BoardsyncError = io_error.into();
        assert!(matches!(error, BoardsyncError::Io(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_str = "invalid: : yaml";
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let error: BoardsyncError = yaml_error.into();
        assert!(matches!(error, BoardsyncError::Yaml(_)));
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let result: Result<()> = Err(BoardsyncError::ContentParse("bad".to_string()).into());
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BoardsyncError>(),
            Some(BoardsyncError::ContentParse(_))
        ));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BoardsyncError>();
    }
}
