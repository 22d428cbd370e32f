//! Typed scanning of move comments
//!
//! Engines annotate moves with `** <score>` comments and the server marks a
//! finished game with a `$END_TIME:` comment on the final move. Everything
//! else is free text for the viewer.

use std::sync::OnceLock;

use regex::Regex;

/// One classified comment line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// Evaluation reported by the engine that played the move
    Score(i64),
    /// The game is over; no further updates will arrive
    EndMarker,
    /// Anything else, shown verbatim
    Other(String),
}

/// Prefix of the comment that closes a finished record
pub const END_MARKER_PREFIX: &str = "$END_TIME:";

fn score_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\*\* (-?[0-9]+)").expect("score pattern is valid"))
}

impl Annotation {
    /// Classify a single comment line
    pub fn classify(line: &str) -> Self {
        if line.starts_with(END_MARKER_PREFIX) {
            return Annotation::EndMarker;
        }
        if let Some(score) = score_pattern()
            .captures(line)
            .and_then(|caps| caps[1].parse::<i64>().ok())
        {
            return Annotation::Score(score);
        }
        Annotation::Other(line.to_string())
    }
}

/// Result of scanning all comments of one move
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveAnnotations {
    /// Last score seen on the move, if any
    pub score: Option<i64>,
    /// Whether the move carries the end marker
    pub terminal: bool,
    /// Lines that were neither scores nor end markers
    pub text: Vec<String>,
}

impl MoveAnnotations {
    /// Free-text lines joined for display
    pub fn comment_text(&self) -> String {
        self.text.join("\n")
    }
}

/// Scan the comment lines of one move in order
///
/// # Examples
///
/// ```
/// use boardsync::annotation::scan_comments;
///
/// let lines = vec!["** 120".to_string(), "nice move".to_string(), "** -35".to_string()];
/// let scanned = scan_comments(&lines);
/// assert_eq!(scanned.score, Some(-35));
/// assert!(!scanned.terminal);
/// assert_eq!(scanned.comment_text(), "nice move");
/// ```
pub fn scan_comments<S: AsRef<str>>(lines: &[S]) -> MoveAnnotations {
    let mut scanned = MoveAnnotations::default();
    for line in lines {
        match Annotation::classify(line.as_ref()) {
            Annotation::Score(score) => scanned.score = Some(score),
            Annotation::EndMarker => scanned.terminal = true,
            Annotation::Other(text) => scanned.text.push(text),
        }
    }
    scanned
}

/// Whether any move of a record carries the end marker
pub fn is_terminal<'a, I>(comment_groups: I) -> bool
where
    I: IntoIterator<Item = &'a [String]>,
{
    comment_groups.into_iter().any(|lines| {
        lines
            .iter()
            .any(|line| Annotation::classify(line) == Annotation::EndMarker)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_score() {
        assert_eq!(Annotation::classify("** 250"), Annotation::Score(250));
        assert_eq!(
            Annotation::classify("** -1200 +2726FU -8384FU"),
            Annotation::Score(-1200)
        );
    }

    #[test]
    fn test_classify_requires_exact_score_prefix() {
        assert_eq!(
            Annotation::classify("**250"),
            Annotation::Other("**250".to_string())
        );
        assert_eq!(
            Annotation::classify(" ** 250"),
            Annotation::Other(" ** 250".to_string())
        );
        assert_eq!(
            Annotation::classify("** abc"),
            Annotation::Other("** abc".to_string())
        );
    }

    #[test]
    fn test_classify_end_marker() {
        assert_eq!(
            Annotation::classify("$END_TIME:2023/01/01 12:30:00"),
            Annotation::EndMarker
        );
        assert_eq!(
            Annotation::classify("summary:toryo alice win bob lose"),
            Annotation::Other("summary:toryo alice win bob lose".to_string())
        );
    }

    #[test]
    fn test_scan_without_score_yields_none() {
        let scanned = scan_comments(&["just text"]);
        assert_eq!(scanned.score, None);
        assert_eq!(scanned.text, vec!["just text".to_string()]);
    }

    #[test]
    fn test_scan_last_score_wins() {
        let scanned = scan_comments(&["** 10", "between", "** 30", "after"]);
        assert_eq!(scanned.score, Some(30));
        assert_eq!(scanned.comment_text(), "between\nafter");
    }

    #[test]
    fn test_scan_marks_terminal() {
        let scanned = scan_comments(&["** 99999", "$END_TIME:2023/01/01 12:30:00"]);
        assert!(scanned.terminal);
        assert_eq!(scanned.score, Some(99999));
        assert!(scanned.text.is_empty());
    }

    #[test]
    fn test_is_terminal_over_record() {
        let open = [vec!["** 1".to_string()], vec![]];
        assert!(!is_terminal(open.iter().map(Vec::as_slice)));

        let closed = [vec![], vec!["$END_TIME:x".to_string()]];
        assert!(is_terminal(closed.iter().map(Vec::as_slice)));
    }
}
