//! Time controls derived from game identifiers
//!
//! A game identifier carries its time control inline, for example
//! `wdoor+floodgate-600-10F+alice+bob+20230101120000` is ten minutes of base
//! time with a ten second Fischer increment, while a missing `F` makes the
//! second number a byoyomi allowance. This module parses that field, computes
//! the remaining clock after a move, and formats clock values for display.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::record::MoveTimeEntry;

/// Time control of a game, in seconds
///
/// `increment` and `byoyomi` are mutually exclusive. When both are zero and
/// `base` is zero the game has no known time control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeControlSpec {
    /// Base thinking time per player
    pub base: u32,
    /// Fischer increment credited after each move
    pub increment: u32,
    /// Fixed per-move allowance once the base time is spent
    pub byoyomi: u32,
}

impl TimeControlSpec {
    /// Fischer-style control (`base` + `increment` per move)
    pub fn fischer(base: u32, increment: u32) -> Self {
        Self {
            base,
            increment,
            byoyomi: 0,
        }
    }

    /// Byoyomi-style control (`base` then `byoyomi` per move)
    pub fn byoyomi(base: u32, byoyomi: u32) -> Self {
        Self {
            base,
            increment: 0,
            byoyomi,
        }
    }

    /// Returns true for the "no time control" state
    pub fn is_unknown(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for TimeControlSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "no time control")
        } else if self.increment > 0 {
            write!(
                f,
                "{} + {}s per move",
                format_clock(i64::from(self.base)),
                self.increment
            )
        } else {
            write!(
                f,
                "{} + {}s byoyomi",
                format_clock(i64::from(self.base)),
                self.byoyomi
            )
        }
    }
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:[A-Za-z0-9_.-]+\+)+[A-Za-z0-9_.-]+-([0-9]+)-([0-9]+)(F)?\+")
            .expect("identifier pattern is valid")
    })
}

/// Parse the time control embedded in a game identifier
///
/// Never fails: an identifier that does not follow the
/// `token+token-{base}-{n}[F]+...` layout yields the zero spec.
///
/// # Examples
///
/// ```
/// use boardsync::time_control::{parse_game_id, TimeControlSpec};
///
/// let spec = parse_game_id("wdoor+floodgate-600-10F+alice+bob+20230101120000");
/// assert_eq!(spec, TimeControlSpec::fischer(600, 10));
///
/// assert!(parse_game_id("not-an-id").is_unknown());
/// ```
pub fn parse_game_id(id: &str) -> TimeControlSpec {
    let Some(caps) = identifier_pattern().captures(id) else {
        return TimeControlSpec::default();
    };

    let base = caps[1].parse::<u32>();
    let extra = caps[2].parse::<u32>();
    match (base, extra) {
        (Ok(base), Ok(extra)) if caps.get(3).is_some() => TimeControlSpec::fischer(base, extra),
        (Ok(base), Ok(extra)) => TimeControlSpec::byoyomi(base, extra),
        _ => {
            tracing::debug!(game_id = %id, "Time control digits out of range");
            TimeControlSpec::default()
        }
    }
}

/// Seconds left on the mover's clock after the move at `move_index`
///
/// Ply 1 and 2 are each side's first move, so the increment is credited once
/// per completed pair after that. The result can be negative; clamp only when
/// formatting.
pub fn remaining_seconds(move_index: usize, elapsed: &MoveTimeEntry, spec: &TimeControlSpec) -> i64 {
    let credited_moves = (move_index.saturating_sub(1) / 2) as i64;
    let limit = i64::from(spec.base) + i64::from(spec.increment) * credited_moves;
    let now = i64::from(elapsed.elapsed_this_move);
    let total = i64::from(elapsed.elapsed_total);
    (limit - total).max(-now) + i64::from(spec.byoyomi)
}

/// Format a clock value as `h:mm:ss`, or `m:ss` below one hour
///
/// Negative values display as `0:00`.
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
