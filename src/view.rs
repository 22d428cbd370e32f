//! Per-move views derived from a parsed record
//!
//! Everything here is recomputed from the record on each update and never
//! stored on its own.

use serde::Serialize;

use crate::annotation::scan_comments;
use crate::record::{GameIdentity, ParsedRecord};
use crate::time_control::{format_clock, remaining_seconds, TimeControlSpec};

/// What the viewer needs to show for one ply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedMoveView {
    pub ply: usize,
    pub notation: Option<String>,
    /// Engine evaluation from the move's comments
    pub score: Option<i64>,
    /// Clock of the side that made this move, after the move; may be negative
    pub remaining_seconds: Option<i64>,
    /// Free-text comments joined by newlines
    pub comment_text: String,
}

impl DerivedMoveView {
    /// Formatted clock after this move, clamped at zero
    pub fn clock_label(&self) -> Option<String> {
        self.remaining_seconds.map(format_clock)
    }
}

/// Derive the view of every ply of a record
///
/// Plies without timing, and all plies of a game without a known time
/// control, have no remaining time.
pub fn derive_move_views(record: &ParsedRecord, spec: &TimeControlSpec) -> Vec<DerivedMoveView> {
    record
        .moves
        .iter()
        .enumerate()
        .map(|(ply, mv)| {
            let scanned = scan_comments(mv.comments.as_slice());
            let remaining = match mv.time {
                Some(time) if !spec.is_unknown() => Some(remaining_seconds(ply, &time, spec)),
                _ => None,
            };
            DerivedMoveView {
                ply,
                notation: mv.notation.clone(),
                score: scanned.score,
                remaining_seconds: remaining,
                comment_text: scanned.comment_text(),
            }
        })
        .collect()
}

/// Formatted clocks of both sides at a given ply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClockLabels {
    /// Side that makes the odd plies
    pub black: Option<String>,
    /// Side that makes the even plies
    pub white: Option<String>,
}

/// Everything a renderer receives on an update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardView {
    pub identity: GameIdentity,
    pub time_control: TimeControlSpec,
    pub moves: Vec<DerivedMoveView>,
    /// Ply currently shown
    pub ply: usize,
    /// The record carries the end marker
    pub terminal: bool,
    /// Public page of the game, when configured
    pub canonical_link: Option<String>,
}

impl BoardView {
    pub fn max_ply(&self) -> usize {
        self.moves.len().saturating_sub(1)
    }

    /// View of the ply currently shown
    pub fn current(&self) -> Option<&DerivedMoveView> {
        self.moves.get(self.ply)
    }

    /// Clock overlay at `ply`: each side's time after its latest move so far
    ///
    /// Uses the same formatting as [`DerivedMoveView::clock_label`]. A side
    /// that has not moved yet shows the base time.
    pub fn clock_labels(&self, ply: usize) -> ClockLabels {
        if self.time_control.is_unknown() {
            return ClockLabels::default();
        }

        let latest = |parity: usize| {
            self.moves
                .iter()
                .take(ply.saturating_add(1))
                .skip(1)
                .filter(|mv| mv.ply % 2 == parity)
                .filter_map(|mv| mv.remaining_seconds)
                .last()
                .unwrap_or_else(|| i64::from(self.time_control.base))
        };

        ClockLabels {
            black: Some(format_clock(latest(1))),
            white: Some(format_clock(latest(0))),
        }
    }
}
