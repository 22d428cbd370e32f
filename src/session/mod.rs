//! Board session controller
//!
//! A [`BoardSession`] follows one game: it owns the [`SessionState`], asks
//! its [`FetchScheduler`] for new content, derives the per-move views and
//! hands a [`BoardView`] to its [`BoardRenderer`] whenever something visible
//! changed.
//!
//! ```text
//! Empty --assign--> Loading --update--> Displayed
//!                      ^                    |
//!                      +--reload / assign---+
//! any --disable--> Stale
//! ```
//!
//! [`task`] runs a session as its own tokio task.

pub mod task;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::fill_template;
use crate::record::{GameIdentity, ParsedRecord, RawRecord};
use crate::scheduler::{FetchOutcome, FetchScheduler};
use crate::time_control::parse_game_id;
use crate::view::{derive_move_views, BoardView};

pub use task::{SessionCommand, SessionHandle};

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// No game assigned yet
    Empty,
    /// Waiting for the first content of the current game
    Loading,
    /// Showing content
    Displayed,
    /// Disabled; never leaves this phase
    Stale,
}

/// Per-board fetch state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub identity: GameIdentity,
    /// Clock time of the last fetch that produced content
    pub last_fetch_ms: Option<u64>,
    pub last_record: Option<RawRecord>,
    pub selected_ply: usize,
    pub polling_enabled: bool,
    pub reached_terminal: bool,
}

impl SessionState {
    pub fn new(identity: GameIdentity) -> Self {
        Self {
            identity,
            last_fetch_ms: None,
            last_record: None,
            selected_ply: 0,
            polling_enabled: true,
            reached_terminal: false,
        }
    }

    /// Whether the held record, if any, belongs to another game
    pub fn identity_changed(&self) -> bool {
        self.last_record
            .as_ref()
            .map_or(true, |record| record.identity.game_id != self.identity.game_id)
    }
}

/// Snapshot of a session for observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub phase: SessionPhase,
    pub reached_terminal: bool,
    /// Ply currently shown, once something is displayed
    pub ply: Option<usize>,
    /// Number of renders caused by new content
    pub updates: u64,
}

/// Consumer of board views
pub trait BoardRenderer: Send {
    /// Show `view`; called on every content update and ply change
    fn render(&mut self, view: &BoardView);

    /// The session is gone; free whatever the board holds
    fn release(&mut self) {}
}

/// Ply to show after an update of the same game
///
/// A viewer on the latest ply keeps following the game; a viewer who stepped
/// back stays put, clamped to the new record length.
pub fn follow_ply(prev_selected: usize, prev_max: usize, new_max: usize) -> usize {
    if prev_selected == prev_max {
        new_max
    } else {
        prev_selected.min(new_max)
    }
}

/// Controller of one board
pub struct BoardSession {
    state: Option<SessionState>,
    phase: SessionPhase,
    scheduler: FetchScheduler,
    renderer: Box<dyn BoardRenderer>,
    view: Option<BoardView>,
    canonical_url: Option<String>,
    cancel: CancellationToken,
    updates: u64,
}

impl BoardSession {
    pub fn new(scheduler: FetchScheduler, renderer: Box<dyn BoardRenderer>) -> Self {
        Self {
            state: None,
            phase: SessionPhase::Empty,
            scheduler,
            renderer,
            view: None,
            canonical_url: None,
            cancel: CancellationToken::new(),
            updates: 0,
        }
    }

    /// Link every view to the public page built from `template`
    pub fn with_canonical_url(mut self, template: Option<String>) -> Self {
        self.canonical_url = template;
        self
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    pub fn view(&self) -> Option<&BoardView> {
        self.view.as_ref()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            phase: self.phase,
            reached_terminal: self.state.as_ref().map_or(false, |s| s.reached_terminal),
            ply: self.view.as_ref().map(|v| v.ply),
            updates: self.updates,
        }
    }

    /// Time until the next automatic poll, if one is pending
    pub fn next_poll_in(&self) -> Option<Duration> {
        if self.phase == SessionPhase::Stale {
            return None;
        }
        self.scheduler.time_until_next_poll()
    }

    /// Follow `identity`, fetching its record right away
    ///
    /// Assigning the game already followed only refreshes its display name.
    pub async fn assign(&mut self, identity: GameIdentity) -> FetchOutcome {
        if self.phase == SessionPhase::Stale {
            return FetchOutcome::Disabled;
        }

        match self.state.as_mut() {
            Some(state) if state.identity.game_id == identity.game_id => {
                if state.identity.game_name == identity.game_name {
                    return FetchOutcome::Unchanged;
                }
                debug!(game_id = %identity.game_id, name = %identity.game_name, "Game renamed");
                // Still waiting for this game's first record: the held record and view
                // belong to the previous game.
                if state.identity_changed() {
                    state.identity = identity;
                    return FetchOutcome::Unchanged;
                }
                if let Some(record) = state.last_record.as_mut() {
                    record.identity = identity.clone();
                }
                state.identity = identity.clone();
                if let Some(view) = self.view.as_mut() {
                    if view.identity.game_id == identity.game_id {
                        view.identity = identity;
                        self.renderer.render(view);
                    }
                }
                return FetchOutcome::Unchanged;
            }
            Some(state) => {
                info!(from = %state.identity.game_id, to = %identity.game_id, "Session reassigned");
                *state = SessionState::new(identity);
            }
            None => {
                info!(game_id = %identity.game_id, "Session assigned");
                self.state = Some(SessionState::new(identity));
            }
        }

        self.phase = SessionPhase::Loading;
        self.cycle(false).await
    }

    /// Fetch now, bypassing the throttle and the unchanged-content check
    pub async fn reload(&mut self) -> FetchOutcome {
        if self.phase == SessionPhase::Stale || self.state.is_none() {
            return FetchOutcome::Disabled;
        }
        self.phase = SessionPhase::Loading;
        self.cycle(true).await
    }

    /// Poll timer wake
    pub async fn poll(&mut self) -> FetchOutcome {
        self.scheduler.cancel_pending();
        self.cycle(false).await
    }

    /// Show another ply of the current record without fetching
    ///
    /// Returns the ply actually shown, clamped to the last move.
    pub fn select_ply(&mut self, ply: usize) -> Option<usize> {
        if self.phase == SessionPhase::Stale {
            return None;
        }
        let view = self.view.as_mut()?;
        let ply = ply.min(view.max_ply());
        view.ply = ply;
        if let Some(state) = self.state.as_mut() {
            state.selected_ply = ply;
        }
        self.renderer.render(view);
        Some(ply)
    }

    /// Stop polling for good and release the board
    pub fn disable(&mut self) {
        if self.phase == SessionPhase::Stale {
            return;
        }
        if let Some(state) = self.state.as_mut() {
            state.polling_enabled = false;
            info!(game_id = %state.identity.game_id, "Session disabled");
        }
        self.scheduler.cancel_pending();
        self.cancel.cancel();
        self.phase = SessionPhase::Stale;
        self.state = None;
        self.view = None;
        self.renderer.release();
    }

    async fn cycle(&mut self, force: bool) -> FetchOutcome {
        let Some(state) = self.state.as_mut() else {
            return FetchOutcome::Disabled;
        };
        let identity_changed = state.identity_changed();
        let prev_selected = state.selected_ply;

        let outcome = self.scheduler.fetch(state, force).await;
        debug!(force, outcome = %outcome, "Fetch cycle finished");

        if self.cancel.is_cancelled() {
            return FetchOutcome::Disabled;
        }

        match &outcome {
            FetchOutcome::Updated(record) => {
                self.apply_update(record, identity_changed, prev_selected);
            }
            _ if self.phase == SessionPhase::Loading && self.view.is_some() && !identity_changed => {
                self.phase = SessionPhase::Displayed;
            }
            _ => {}
        }

        outcome
    }

    fn apply_update(&mut self, record: &Arc<ParsedRecord>, identity_changed: bool, prev_selected: usize) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let spec = parse_game_id(&state.identity.game_id);
        let moves = derive_move_views(record, &spec);
        let new_max = moves.len().saturating_sub(1);
        let ply = match self.view.as_ref() {
            Some(prev) if !identity_changed => follow_ply(prev_selected, prev.max_ply(), new_max),
            _ => new_max,
        };
        state.selected_ply = ply;

        let view = BoardView {
            identity: state.identity.clone(),
            time_control: spec,
            moves,
            ply,
            terminal: state.reached_terminal,
            canonical_link: self
                .canonical_url
                .as_deref()
                .map(|template| fill_template(template, &state.identity.game_id)),
        };

        self.renderer.render(&view);
        self.view = Some(view);
        self.phase = SessionPhase::Displayed;
        self.updates += 1;
    }
}
