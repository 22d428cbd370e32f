//! Game records and their identities
//!
//! A record is fetched as raw text, compared byte for byte against the last
//! fetch, and then handed to a [`RecordReader`] which turns it into a
//! [`ParsedRecord`]. The notation itself belongs to the reader; the rest of
//! the crate only looks at moves, per-move timing, and per-move comments.
//!
//! # Modules
//!
//! - [`csa`]: default reader for CSA-style records

pub mod csa;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use csa::CsaReader;

/// Identity of a game as listed by the remote source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameIdentity {
    /// Opaque identifier used to build record URLs
    pub game_id: String,
    /// Human-readable name shown to the viewer
    pub game_name: String,
}

impl GameIdentity {
    pub fn new(game_id: impl Into<String>, game_name: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            game_name: game_name.into(),
        }
    }

    /// Identity whose display name is the id itself
    pub fn from_id(game_id: impl Into<String>) -> Self {
        let game_id = game_id.into();
        Self {
            game_name: game_id.clone(),
            game_id,
        }
    }
}

/// Raw record text together with the identity it was fetched for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub identity: GameIdentity,
    pub text: String,
}

/// Clock usage reported for one move, in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveTimeEntry {
    /// Time spent on this move
    pub elapsed_this_move: u32,
    /// Time the mover has spent over the whole game, this move included
    pub elapsed_total: u32,
}

/// One ply of a parsed record
///
/// Ply 0 is the initial position and never carries notation or timing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordMove {
    pub notation: Option<String>,
    pub time: Option<MoveTimeEntry>,
    pub comments: Vec<String>,
}

/// A record as understood by a [`RecordReader`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRecord {
    /// Header values such as player names and `$KEY:value` lines
    pub headers: BTreeMap<String, String>,
    /// `moves[0]` is the initial position, `moves[n]` is ply `n`
    pub moves: Vec<RecordMove>,
}

impl ParsedRecord {
    /// Highest ply in the record (0 when no move has been played)
    pub fn max_ply(&self) -> usize {
        self.moves.len().saturating_sub(1)
    }
}

/// Capability that turns fetched record text into moves
///
/// Implementations report unreadable content as
/// [`BoardsyncError::ContentParse`](crate::error::BoardsyncError::ContentParse).
pub trait RecordReader: Send + Sync {
    fn read(&self, text: &str) -> Result<ParsedRecord>;
}
