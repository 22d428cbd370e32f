//! Multi-board mode
//!
//! A [`BoardSet`] keeps one running session per game of the current list
//! window. Each list refresh reconciles the list log, spawns sessions for
//! games that entered the window and disables the ones that left it. The
//! window itself is shared with observers as an `Arc<ListWindow>`.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::game_list::{reconcile, LineLogParser, ListPolicy, ListWindow, LogParser};
use crate::record::{CsaReader, GameIdentity, RecordReader};
use crate::scheduler::{Clock, FetchScheduler, MonotonicClock, PollPolicy};
use crate::session::{BoardRenderer, BoardSession, SessionHandle};
use crate::source::RecordSource;

/// Builds the renderer of a newly spawned board
pub type RendererFactory = Box<dyn FnMut(&GameIdentity) -> Box<dyn BoardRenderer> + Send>;

/// Set of boards following the most recent games
pub struct BoardSet {
    config: Config,
    source: Arc<dyn RecordSource>,
    reader: Arc<dyn RecordReader>,
    log_parser: Arc<dyn LogParser>,
    clock: Arc<dyn Clock>,
    make_renderer: RendererFactory,
    boards: HashMap<String, SessionHandle>,
    window: Arc<ListWindow>,
}

impl BoardSet {
    /// Create an empty set using the default reader, log parser and clock
    pub fn new(config: Config, source: Arc<dyn RecordSource>, make_renderer: RendererFactory) -> Self {
        Self {
            config,
            source,
            reader: Arc::new(CsaReader::new()),
            log_parser: Arc::new(LineLogParser),
            clock: Arc::new(MonotonicClock::new()),
            make_renderer,
            boards: HashMap::new(),
            window: Arc::new(ListWindow::default()),
        }
    }

    pub fn with_reader(mut self, reader: Arc<dyn RecordReader>) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_log_parser(mut self, log_parser: Arc<dyn LogParser>) -> Self {
        self.log_parser = log_parser;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Current list window
    pub fn window(&self) -> Arc<ListWindow> {
        Arc::clone(&self.window)
    }

    /// Ids of the followed games, most recent first
    pub fn active_ids(&self) -> Vec<String> {
        self.window
            .identities()
            .filter(|identity| self.boards.contains_key(&identity.game_id))
            .map(|identity| identity.game_id.clone())
            .collect()
    }

    pub fn board(&self, game_id: &str) -> Option<&SessionHandle> {
        self.boards.get(game_id)
    }

    /// Fetch and reconcile the game list, then update the boards
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be fetched; the boards are left
    /// untouched in that case.
    pub async fn refresh_list(&mut self) -> Result<Arc<ListWindow>> {
        let log = self.source.fetch_list().await?;
        let entries = self.log_parser.parse(&log);
        let parsed = entries.len();

        let window = reconcile(
            entries,
            ListPolicy::windowed_ms(self.config.polling.window_span_ms),
        )
        .truncated(self.config.polling.max_boards);
        debug!(parsed, kept = window.len(), "Game list reconciled");

        let window = Arc::new(window);
        self.apply_window(Arc::clone(&window));
        Ok(window)
    }

    /// Spawn, rename and disable boards to match `window`
    pub fn apply_window(&mut self, window: Arc<ListWindow>) {
        let gone: Vec<String> = self
            .boards
            .keys()
            .filter(|id| !window.contains(id))
            .cloned()
            .collect();
        for game_id in gone {
            if let Some(handle) = self.boards.remove(&game_id) {
                info!(game_id = %game_id, "Game left the list, disabling board");
                handle.disable();
            }
        }

        for identity in window.identities() {
            match self.boards.get(&identity.game_id) {
                Some(handle) => handle.assign(identity.clone()),
                None => {
                    info!(game_id = %identity.game_id, name = %identity.game_name, "Following new game");
                    let handle = self.spawn_board(identity);
                    self.boards.insert(identity.game_id.clone(), handle);
                }
            }
        }

        self.window = window;
    }

    fn spawn_board(&mut self, identity: &GameIdentity) -> SessionHandle {
        let scheduler = FetchScheduler::new(
            Arc::clone(&self.source),
            Arc::clone(&self.reader),
            Arc::clone(&self.clock),
            PollPolicy::from(&self.config.polling),
        );
        let renderer = (self.make_renderer)(identity);
        let session = BoardSession::new(scheduler, renderer)
            .with_canonical_url(self.config.source.canonical_url.clone());
        let handle = SessionHandle::spawn(session);
        handle.assign(identity.clone());
        handle
    }

    /// Refresh the list now and then on every `list_refresh_ms` until `shutdown`
    ///
    /// Failed refreshes are logged and keep the current boards.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<()> {
        let mut ticker = tokio::time::interval(self.config.polling.list_refresh());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh_list().await {
                        warn!(error = %e, "List refresh failed, keeping current boards");
                    }
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Disable every board and wait for their tasks
    pub async fn shutdown(&mut self) {
        for (game_id, handle) in self.boards.drain() {
            handle.disable();
            if let Err(e) = handle.join().await {
                warn!(game_id = %game_id, error = %e, "Board task ended abnormally");
            }
        }
        self.window = Arc::new(ListWindow::default());
    }
}
