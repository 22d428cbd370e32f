//! Game list reconciliation
//!
//! The list source publishes a log that may mention the same game several
//! times, with later lines carrying corrected names. [`reconcile`] turns the
//! parsed entries into a clean [`ListWindow`]: one entry per id, ordered by
//! the start time embedded in the id, and optionally cut down to the games
//! that started close to the most recent one.
//!
//! Reconciliation is idempotent, so a window can be fed back through
//! [`reconcile`] without changing it.

use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;

use crate::record::GameIdentity;
use crate::time_control::parse_game_id;

/// How a list is ordered and filtered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPolicy {
    /// Oldest first, nothing dropped
    Chronological,
    /// Most recent first, only games within `span` of the most recent one
    Windowed { span: Duration },
}

impl ListPolicy {
    /// Windowed policy with a span in milliseconds
    pub fn windowed_ms(span_ms: u64) -> Self {
        ListPolicy::Windowed {
            span: Duration::from_millis(span_ms),
        }
    }
}

/// One reconciled entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    #[serde(flatten)]
    pub identity: GameIdentity,
    /// Start time embedded in the id, when present
    pub started_at: Option<NaiveDateTime>,
}

/// Ordered, deduplicated list of games
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListWindow {
    pub entries: Vec<ListEntry>,
    /// Timestamp the window was measured from (windowed policy only)
    pub reference: Option<NaiveDateTime>,
}

impl ListWindow {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, game_id: &str) -> bool {
        self.entries.iter().any(|e| e.identity.game_id == game_id)
    }

    /// Identities in window order
    pub fn identities(&self) -> impl Iterator<Item = &GameIdentity> + '_ {
        self.entries.iter().map(|e| &e.identity)
    }

    /// Keep only the first `limit` entries
    pub fn truncated(mut self, limit: usize) -> Self {
        self.entries.truncate(limit);
        self
    }
}

fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([0-9]{14})[^0-9]?[0-9]*$").expect("timestamp pattern is valid")
    })
}

/// Start time embedded in a game id (`YYYYMMDDHHMMSS` before the trailing field)
///
/// # Examples
///
/// ```
/// use boardsync::game_list::embedded_timestamp;
///
/// let ts = embedded_timestamp("wdoor+floodgate-300-10F+a+b+20230101120005").unwrap();
/// assert_eq!(ts.to_string(), "2023-01-01 12:00:05");
/// assert!(embedded_timestamp("no-digits-here").is_none());
/// ```
pub fn embedded_timestamp(game_id: &str) -> Option<NaiveDateTime> {
    let caps = timestamp_pattern().captures(game_id)?;
    NaiveDateTime::parse_from_str(&caps[1], "%Y%m%d%H%M%S").ok()
}

/// Deduplicate, order and optionally window a list of games
///
/// The last entry for each id wins. Ties on the start time are ordered by id
/// so the output never depends on input order.
pub fn reconcile<I>(entries: I, policy: ListPolicy) -> ListWindow
where
    I: IntoIterator<Item = GameIdentity>,
{
    let mut latest: HashMap<String, GameIdentity> = HashMap::new();
    for identity in entries {
        latest.insert(identity.game_id.clone(), identity);
    }

    let mut entries: Vec<ListEntry> = latest
        .into_values()
        .map(|identity| ListEntry {
            started_at: embedded_timestamp(&identity.game_id),
            identity,
        })
        .collect();

    entries.sort_by(|a, b| {
        (a.started_at, &a.identity.game_id).cmp(&(b.started_at, &b.identity.game_id))
    });

    match policy {
        ListPolicy::Chronological => ListWindow {
            entries,
            reference: None,
        },
        ListPolicy::Windowed { span } => {
            entries.reverse();
            let reference = entries.first().and_then(|e| e.started_at);
            let span_ms = i64::try_from(span.as_millis()).unwrap_or(i64::MAX);
            entries.retain(|entry| match (entry.started_at, reference) {
                (Some(started), Some(reference)) => {
                    (reference - started).num_milliseconds().abs() <= span_ms
                }
                _ => false,
            });
            ListWindow { entries, reference }
        }
    }
}

/// Capability that extracts game entries from the list source's log text
pub trait LogParser: Send + Sync {
    fn parse(&self, log: &str) -> Vec<GameIdentity>;
}

/// Default [`LogParser`]: `<game_id> [display name]` per line
///
/// Lines whose first token does not look like a game id are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineLogParser;

impl LogParser for LineLogParser {
    fn parse(&self, log: &str) -> Vec<GameIdentity> {
        log.lines()
            .filter_map(|line| {
                let line = line.trim();
                let (id, rest) = line
                    .split_once(char::is_whitespace)
                    .unwrap_or((line, ""));
                if id.is_empty() || parse_game_id(id).is_unknown() {
                    return None;
                }
                let name = rest.trim();
                Some(if name.is_empty() {
                    GameIdentity::from_id(id)
                } else {
                    GameIdentity::new(id, name)
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str, ts: &str) -> GameIdentity {
        GameIdentity::new(format!("wdoor+floodgate-300-10F+{name}+{ts}"), name)
    }

    fn ids(window: &ListWindow) -> Vec<String> {
        window
            .identities()
            .map(|i| i.game_name.clone())
            .collect()
    }

    #[test]
    fn test_dedup_keeps_last_name() {
        let entries = vec![
            GameIdentity::new("X", "old"),
            GameIdentity::new("Y", "y"),
            GameIdentity::new("X", "new"),
        ];
        let window = reconcile(entries, ListPolicy::Chronological);
        assert_eq!(window.len(), 2);
        let x = window
            .entries
            .iter()
            .find(|e| e.identity.game_id == "X")
            .unwrap();
        assert_eq!(x.identity.game_name, "new");
    }

    #[test]
    fn test_embedded_timestamp_variants() {
        let plain = embedded_timestamp("a+b-60-0+20230101120000").unwrap();
        assert_eq!(plain.to_string(), "2023-01-01 12:00:00");

        let with_sequence = embedded_timestamp("a+b-60-0+20230101120000+3").unwrap();
        assert_eq!(with_sequence, plain);

        let glued_sequence = embedded_timestamp("a+b-60-0+2023010112000042").unwrap();
        assert_eq!(glued_sequence, plain);

        assert!(embedded_timestamp("a+b-60-0+20231399120000").is_none());
        assert!(embedded_timestamp("a+b-60-0+2023").is_none());
    }

    #[test]
    fn test_chronological_order() {
        let entries = vec![
            id("c", "20230101130000"),
            id("a", "20230101110000"),
            id("b", "20230101120000"),
        ];
        let window = reconcile(entries, ListPolicy::Chronological);
        assert_eq!(ids(&window), vec!["a", "b", "c"]);
        assert_eq!(window.reference, None);
    }

    #[test]
    fn test_undated_entries_sort_first_in_chronological_mode() {
        let entries = vec![id("a", "20230101110000"), GameIdentity::from_id("undated")];
        let window = reconcile(entries, ListPolicy::Chronological);
        assert_eq!(window.entries[0].identity.game_id, "undated");
    }

    #[test]
    fn test_windowed_keeps_recent_games_most_recent_first() {
        let entries = vec![
            id("old", "20230101100000"),
            id("edge", "20230101112000"),
            id("recent", "20230101115000"),
            id("latest", "20230101120000"),
            GameIdentity::from_id("undated"),
        ];
        let window = reconcile(entries, ListPolicy::windowed_ms(2_400_000));
        assert_eq!(ids(&window), vec!["latest", "recent", "edge"]);
        assert_eq!(
            window.reference,
            embedded_timestamp("x+20230101120000")
        );
    }

    #[test]
    fn test_windowed_empty_input() {
        let window = reconcile(Vec::new(), ListPolicy::windowed_ms(1000));
        assert!(window.is_empty());
        assert_eq!(window.reference, None);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let entries = vec![
            id("a", "20230101110000"),
            id("b", "20230101115500"),
            id("b", "20230101115500"),
            id("c", "20230101120000"),
            GameIdentity::from_id("undated"),
        ];
        for policy in [ListPolicy::Chronological, ListPolicy::windowed_ms(2_400_000)] {
            let once = reconcile(entries.clone(), policy);
            let twice = reconcile(once.identities().cloned(), policy);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_reconcile_ignores_input_order() {
        let mut entries = vec![
            id("a", "20230101110000"),
            GameIdentity::new("a+b-1-1+20230101110000", "z"),
            GameIdentity::new("a+a-1-1+20230101110000", "y"),
            id("c", "20230101120000"),
        ];
        let forward = reconcile(entries.clone(), ListPolicy::Chronological);
        entries.reverse();
        let backward = reconcile(entries, ListPolicy::Chronological);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_truncated_window() {
        let entries = vec![id("a", "20230101110000"), id("b", "20230101110500")];
        let window = reconcile(entries, ListPolicy::windowed_ms(2_400_000)).truncated(1);
        assert_eq!(ids(&window), vec!["b"]);
        assert!(window.contains("wdoor+floodgate-300-10F+b+20230101110500"));
    }

    #[test]
    fn test_line_log_parser() {
        let log = "\
wdoor+floodgate-300-10F+alice+bob+20230101120000 alice vs bob
# comment line
garbage

wdoor+floodgate-600-10+carol+dave+20230101123000
";
        let entries = LineLogParser.parse(log);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].game_name, "alice vs bob");
        assert_eq!(
            entries[1].game_name,
            "wdoor+floodgate-600-10+carol+dave+20230101123000"
        );
    }
}
