//! Command handlers for the CLI
//!
//! - `watch`   follow one game until it ends
//! - `live`    follow the most recent games side by side
//! - `history` print the reconciled game list
//! - `clock`   show the time control of an identifier
//!
//! The handlers are small and only wire library components together.

use std::sync::Arc;

use colored::Colorize;
use tokio_util::sync::CancellationToken;

use crate::board_set::{BoardSet, RendererFactory};
use crate::config::Config;
use crate::error::{BoardsyncError, Result};
use crate::game_list::LineLogParser;
use crate::record::{CsaReader, GameIdentity};
use crate::scheduler::{FetchScheduler, MonotonicClock, PollPolicy};
use crate::session::{BoardRenderer, BoardSession, SessionHandle};
use crate::source::HttpRecordSource;
use crate::time_control::parse_game_id;

pub mod history;
pub mod terminal;

use terminal::TerminalRenderer;

// Single game follower
pub mod watch {
    //! Follows one game in the terminal until the end marker shows up or
    //! the user interrupts.

    use super::*;

    /// Follow `game_id`, or the most recent game of the history when absent
    ///
    /// # Errors
    ///
    /// Returns error if the source is not configured, or if no id is given
    /// and the history cannot be loaded or is empty
    pub async fn run_watch(
        config: Config,
        game_id: Option<String>,
        name: Option<String>,
    ) -> Result<()> {
        let source = Arc::new(HttpRecordSource::new(config.clone())?);
        // Fail before spawning anything when records cannot be addressed.
        config.record_url("")?;

        let identity = match game_id {
            Some(id) => {
                let name = name.unwrap_or_else(|| id.clone());
                GameIdentity::new(id, name)
            }
            None => {
                let window = history::load_history(source.as_ref(), &LineLogParser).await?;
                let latest = window.entries.last().ok_or_else(|| {
                    BoardsyncError::ContentParse("the game list is empty".to_string())
                })?;
                let mut identity = latest.identity.clone();
                if let Some(name) = name {
                    identity.game_name = name;
                }
                identity
            }
        };
        tracing::info!(game_id = %identity.game_id, "Watching game");

        let scheduler = FetchScheduler::new(
            source,
            Arc::new(CsaReader::new()),
            Arc::new(MonotonicClock::new()),
            PollPolicy::from(&config.polling),
        );
        let session = BoardSession::new(scheduler, Box::new(TerminalRenderer::new()))
            .with_canonical_url(config.source.canonical_url.clone());
        let handle = SessionHandle::spawn(session);
        handle.assign(identity);

        let mut status = handle.subscribe();
        tokio::select! {
            finished = status.wait_for(|s| s.reached_terminal) => {
                if finished.is_ok() {
                    tracing::info!("Game finished");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping");
            }
        }

        handle.disable();
        handle.join().await
    }
}

// Multi-board follower
pub mod live {
    //! Follows every game of the current list window until interrupted.

    use super::*;

    /// Follow the most recent games, one prefixed output stream per board
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP source cannot be created
    pub async fn run_live(mut config: Config, boards: Option<usize>) -> Result<()> {
        if let Some(boards) = boards {
            if boards == 0 {
                return Err(
                    BoardsyncError::Config("--boards must be greater than 0".to_string()).into(),
                );
            }
            config.polling.max_boards = boards;
        }
        config.list_url()?;

        let source = Arc::new(HttpRecordSource::new(config.clone())?);
        let factory: RendererFactory =
            Box::new(|identity: &GameIdentity| -> Box<dyn BoardRenderer> {
                Box::new(TerminalRenderer::with_prefix(identity.game_name.clone()))
            });
        let mut set = BoardSet::new(config, source, factory);

        let shutdown = CancellationToken::new();
        let interrupt = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted, stopping all boards");
            }
            interrupt.cancel();
        });

        set.run(shutdown).await
    }
}

/// Print the time control encoded in `game_id`
pub fn show_clock(game_id: &str) {
    let spec = parse_game_id(game_id);
    if spec.is_unknown() {
        println!("{}", "no time control".yellow());
        return;
    }
    println!("{}", spec.to_string().bold());
    println!("  base:      {}s", spec.base);
    println!("  increment: {}s", spec.increment);
    println!("  byoyomi:   {}s", spec.byoyomi);
}
