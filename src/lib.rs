//! boardsync - live game record synchronizer library
//!
//! This library polls game records from a remote source, derives per-move
//! clocks and engine scores, and keeps one or more boards in sync with the
//! games as they are played.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `time_control`: time control parsing from game ids and clock arithmetic
//! - `annotation`: score, end marker and comment classification
//! - `record`: game identities, raw and parsed records, the CSA reader
//! - `game_list`: list log parsing and reconciliation
//! - `source`: HTTP record and list source
//! - `scheduler`: throttled, deduplicating fetch scheduling
//! - `session`: board session controller and its task
//! - `board_set`: multi-board mode
//! - `view`: per-move views handed to renderers
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use boardsync::{BoardSession, Config, FetchScheduler, GameIdentity, HttpRecordSource};
//! use boardsync::record::CsaReader;
//! use boardsync::scheduler::{MonotonicClock, PollPolicy};
//! use boardsync::commands::terminal::TerminalRenderer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let scheduler = FetchScheduler::new(
//!         Arc::new(HttpRecordSource::new(config.clone())?),
//!         Arc::new(CsaReader::new()),
//!         Arc::new(MonotonicClock::new()),
//!         PollPolicy::from(&config.polling),
//!     );
//!     let mut session = BoardSession::new(scheduler, Box::new(TerminalRenderer::new()));
//!     session
//!         .assign(GameIdentity::from_id("wdoor+floodgate-600-10F+a+b+20230101120000"))
//!         .await;
//!     Ok(())
//! }
//! ```

pub mod annotation;
pub mod board_set;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod game_list;
pub mod logging;
pub mod record;
pub mod scheduler;
pub mod session;
pub mod source;
pub mod time_control;
pub mod view;

// Re-export commonly used types
pub use board_set::BoardSet;
pub use config::Config;
pub use error::{BoardsyncError, Result};
pub use record::{GameIdentity, ParsedRecord, RecordReader};
pub use scheduler::{FetchOutcome, FetchScheduler};
pub use session::{BoardRenderer, BoardSession, SessionHandle};
pub use source::{HttpRecordSource, RecordSource};
pub use time_control::TimeControlSpec;

#[cfg(test)]
pub mod test_utils;
