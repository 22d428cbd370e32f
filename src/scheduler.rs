//! Fetch scheduling for one board session
//!
//! [`FetchScheduler`] decides, per call, whether a record fetch happens at
//! all, whether its result counts as an update, and when the next poll is
//! due. It owns the poll timer; the session owns the [`SessionState`] it
//! reads and updates.
//!
//! | condition | outcome |
//! |---|---|
//! | polling disabled | [`FetchOutcome::Disabled`], timer cleared |
//! | not forced, same identity, inside the throttle window | [`FetchOutcome::Throttled`] |
//! | same identity, not forced, byte-identical text | [`FetchOutcome::Unchanged`], timer re-armed unless terminal |
//! | new text, new identity, or forced | [`FetchOutcome::Updated`], timer re-armed unless terminal |
//! | network or parse failure | [`FetchOutcome::Failed`], timer re-armed |

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::annotation::is_terminal;
use crate::config::PollingConfig;
use crate::record::{ParsedRecord, RawRecord, RecordReader};
use crate::session::SessionState;
use crate::source::RecordSource;

/// Millisecond clock used for throttling and poll deadlines
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Production clock backed by tokio's monotonic instant
///
/// Follows tokio's paused test clock, so timer tests stay deterministic.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: tokio::time::Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.now.fetch_add(by, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Throttle and retry timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Minimum spacing of non-forced fetches
    pub throttle: Duration,
    /// Delay before the next poll after a fetch or a failure
    pub retry_delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            throttle: config.throttle(),
            retry_delay: config.retry_delay(),
        }
    }
}

/// Result of one [`FetchScheduler::fetch`] call
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Polling is disabled; nothing was fetched or scheduled
    Disabled,
    /// Too soon after the previous fetch; nothing was fetched
    Throttled,
    /// Same text as last time; consumers are not notified
    Unchanged,
    /// New content for consumers
    Updated(Arc<ParsedRecord>),
    /// The fetch or the parse failed; a retry is scheduled
    Failed,
}

impl FetchOutcome {
    pub fn is_update(&self) -> bool {
        matches!(self, FetchOutcome::Updated(_))
    }

    fn label(&self) -> &'static str {
        match self {
            FetchOutcome::Disabled => "disabled",
            FetchOutcome::Throttled => "throttled",
            FetchOutcome::Unchanged => "unchanged",
            FetchOutcome::Updated(_) => "updated",
            FetchOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-session fetch decisions and poll timer
pub struct FetchScheduler {
    source: Arc<dyn RecordSource>,
    reader: Arc<dyn RecordReader>,
    clock: Arc<dyn Clock>,
    policy: PollPolicy,
    /// Deadline of the next automatic poll, in clock milliseconds
    next_poll_ms: Option<u64>,
}

impl FetchScheduler {
    pub fn new(
        source: Arc<dyn RecordSource>,
        reader: Arc<dyn RecordReader>,
        clock: Arc<dyn Clock>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            source,
            reader,
            clock,
            policy,
            next_poll_ms: None,
        }
    }

    /// Deadline of the pending poll, if any
    pub fn next_poll_ms(&self) -> Option<u64> {
        self.next_poll_ms
    }

    /// Time left until the pending poll is due (zero when overdue)
    pub fn time_until_next_poll(&self) -> Option<Duration> {
        let now = self.clock.now_ms();
        self.next_poll_ms
            .map(|deadline| Duration::from_millis(deadline.saturating_sub(now)))
    }

    /// Drop the pending poll, if any
    pub fn cancel_pending(&mut self) {
        self.next_poll_ms = None;
    }

    fn schedule_after(&mut self, from_ms: u64, delay: Duration) {
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.next_poll_ms = Some(from_ms.saturating_add(delay_ms));
        debug!(delay_ms, "Next poll scheduled");
    }

    /// Run one fetch cycle for `state`
    ///
    /// Never returns an error: failures become [`FetchOutcome::Failed`] with a
    /// retry scheduled. A forced call drops any pending poll before fetching,
    /// so its result is the one left in `state`.
    pub async fn fetch(&mut self, state: &mut SessionState, force: bool) -> FetchOutcome {
        let game_id = state.identity.game_id.clone();

        if !state.polling_enabled {
            self.next_poll_ms = None;
            debug!(game_id = %game_id, "Polling disabled, skipping fetch");
            return FetchOutcome::Disabled;
        }

        let identity_changed = state.identity_changed();
        let started_ms = self.clock.now_ms();
        let throttle_ms = u64::try_from(self.policy.throttle.as_millis()).unwrap_or(u64::MAX);

        if !force && !identity_changed {
            if let Some(last_ms) = state.last_fetch_ms {
                if started_ms.saturating_sub(last_ms) < throttle_ms {
                    // A wake inside the window must not end the poll loop.
                    if self.next_poll_ms.is_none() && !state.reached_terminal {
                        self.schedule_after(last_ms, self.policy.throttle);
                    }
                    debug!(game_id = %game_id, "Fetch throttled");
                    return FetchOutcome::Throttled;
                }
            }
        }

        if force {
            self.cancel_pending();
        }

        debug!(game_id = %game_id, force, identity_changed, "Fetching record");
        let text = match self.source.fetch_record(&game_id).await {
            Ok(text) => text,
            Err(e) => {
                warn!(game_id = %game_id, error = %e, "Record fetch failed, will retry");
                self.schedule_after(self.clock.now_ms(), self.policy.retry_delay);
                return FetchOutcome::Failed;
            }
        };
        let fetched_ms = self.clock.now_ms();

        let raw = RawRecord {
            identity: state.identity.clone(),
            text,
        };

        if !force && !identity_changed && state.last_record.as_ref() == Some(&raw) {
            state.last_fetch_ms = Some(started_ms);
            if state.reached_terminal {
                self.next_poll_ms = None;
            } else {
                self.schedule_after(fetched_ms, self.policy.retry_delay);
            }
            debug!(game_id = %game_id, "Record unchanged");
            return FetchOutcome::Unchanged;
        }

        let parsed = match self.reader.read(&raw.text) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(game_id = %game_id, error = %e, "Record could not be read, will retry");
                self.schedule_after(fetched_ms, self.policy.retry_delay);
                return FetchOutcome::Failed;
            }
        };

        let terminal = is_terminal(parsed.moves.iter().map(|mv| mv.comments.as_slice()));
        state.last_fetch_ms = Some(started_ms);
        state.last_record = Some(raw);
        state.reached_terminal = terminal;

        if terminal {
            self.next_poll_ms = None;
            info!(game_id = %game_id, plies = parsed.max_ply(), "Game finished, polling stopped");
        } else {
            self.schedule_after(fetched_ms, self.policy.retry_delay);
        }

        FetchOutcome::Updated(Arc::new(parsed))
    }
}
