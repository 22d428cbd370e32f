//! Remote record and list sources
//!
//! The scheduler and the board set only see the [`RecordSource`] trait.
//! [`HttpRecordSource`] is the production implementation: a plain `GET` per
//! request with a timeout, a status check and a size limit. Failures are
//! reported as [`BoardsyncError::Network`] and never retried here; retrying is
//! the scheduler's job.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::error::{BoardsyncError, Result};

/// Source of raw record and list text
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the raw record text of one game
    async fn fetch_record(&self, game_id: &str) -> Result<String>;

    /// Fetch the raw game list log
    async fn fetch_list(&self) -> Result<String>;
}

/// HTTP implementation of [`RecordSource`]
#[derive(Clone)]
pub struct HttpRecordSource {
    /// HTTP client instance
    client: reqwest::Client,
    /// Configuration holding the URL templates
    config: Config,
    /// Maximum size in bytes for fetched content
    max_size_bytes: usize,
}

impl HttpRecordSource {
    /// Create a new HTTP source from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.source.request_timeout_secs))
            .user_agent(concat!("boardsync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            max_size_bytes: config.source.max_record_bytes,
            config,
        })
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let parsed = url::Url::parse(url)
            .map_err(|e| BoardsyncError::Config(format!("Invalid URL {}: {}", url, e)))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| BoardsyncError::Network(format!("Failed to fetch {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                BoardsyncError::Network(format!("HTTP {} for {}", status.as_u16(), url)).into(),
            );
        }

        let bytes = response.bytes().await.map_err(|e| {
            BoardsyncError::Network(format!("Failed to read response body: {}", e))
        })?;

        if bytes.len() > self.max_size_bytes {
            return Err(BoardsyncError::ContentParse(format!(
                "{} bytes from {} exceeds the {} byte limit",
                bytes.len(),
                url,
                self.max_size_bytes
            ))
            .into());
        }

        let size_bytes = bytes.len();
        let text = String::from_utf8(bytes.to_vec()).map_err(|e| {
            BoardsyncError::ContentParse(format!("{} is not valid UTF-8: {}", url, e))
        })?;

        debug!(url = %url, size_bytes, "Fetched content");
        Ok(text)
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn fetch_record(&self, game_id: &str) -> Result<String> {
        let url = self.config.record_url(game_id)?;
        self.get_text(&url).await
    }

    async fn fetch_list(&self) -> Result<String> {
        let url = self.config.list_url()?;
        self.get_text(&url).await
    }
}
