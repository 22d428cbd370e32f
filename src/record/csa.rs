//! CSA-style record reader
//!
//! Understands the subset of the CSA notation that live records use:
//!
//! - `N+name` / `N-name` player names
//! - `$KEY:value` headers
//! - `+7776FU` / `-3334FU` moves and `%TORYO`-style special moves
//! - `T12` seconds spent on the preceding move
//! - `'text` comments, attached to the latest ply
//!
//! Several statements may share a line separated by `,`, except comments
//! which always run to the end of the line. Version (`V`), position (`P`) and
//! side-to-move lines are accepted and skipped.

use tracing::trace;

use crate::error::{BoardsyncError, Result};
use crate::record::{MoveTimeEntry, ParsedRecord, RecordMove, RecordReader};

/// Default [`RecordReader`] for CSA-style text
#[derive(Debug, Clone, Copy, Default)]
pub struct CsaReader;

impl CsaReader {
    pub fn new() -> Self {
        Self
    }
}

impl RecordReader for CsaReader {
    fn read(&self, text: &str) -> Result<ParsedRecord> {
        if text.trim().is_empty() {
            return Err(BoardsyncError::ContentParse("empty record".to_string()).into());
        }

        let mut record = ParsedRecord {
            moves: vec![RecordMove::default()],
            ..Default::default()
        };
        // Running totals per side: index 1 for the first mover, 0 for the second.
        let mut totals = [0u32; 2];
        let mut recognized = false;

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');

            if let Some(comment) = line.strip_prefix('\'') {
                if let Some(current) = record.moves.last_mut() {
                    current.comments.push(comment.to_string());
                }
                recognized = true;
                continue;
            }

            if line.trim_start().starts_with('<') {
                return Err(BoardsyncError::ContentParse(format!(
                    "markup found on line {}",
                    line_no + 1
                ))
                .into());
            }

            for statement in line.split(',').map(str::trim) {
                if statement.is_empty() {
                    continue;
                }
                recognized |= apply_statement(&mut record, &mut totals, statement, line_no)?;
            }
        }

        if !recognized {
            return Err(
                BoardsyncError::ContentParse("no record statements found".to_string()).into(),
            );
        }

        Ok(record)
    }
}

fn apply_statement(
    record: &mut ParsedRecord,
    totals: &mut [u32; 2],
    statement: &str,
    line_no: usize,
) -> Result<bool> {
    let mut chars = statement.chars();
    let Some(first) = chars.next() else {
        return Ok(false);
    };
    let rest = chars.as_str();

    match first {
        'N' if rest.starts_with('+') => {
            record
                .headers
                .insert("black".to_string(), rest[1..].to_string());
        }
        'N' if rest.starts_with('-') => {
            record
                .headers
                .insert("white".to_string(), rest[1..].to_string());
        }
        '$' => {
            if let Some((key, value)) = rest.split_once(':') {
                record.headers.insert(key.to_string(), value.to_string());
            }
        }
        '+' | '-' if rest.is_empty() => {}
        '+' | '-' | '%' => {
            record.moves.push(RecordMove {
                notation: Some(statement.to_string()),
                ..Default::default()
            });
        }
        'T' => {
            let seconds = rest
                .split('.')
                .next()
                .unwrap_or_default()
                .parse::<u32>()
                .map_err(|_| {
                    BoardsyncError::ContentParse(format!(
                        "invalid time '{}' on line {}",
                        statement,
                        line_no + 1
                    ))
                })?;
            let ply = record.max_ply();
            if ply == 0 {
                trace!(line = line_no + 1, "Time statement before the first move");
                return Ok(true);
            }
            let side = ply % 2;
            totals[side] = totals[side].saturating_add(seconds);
            if let Some(current) = record.moves.last_mut() {
                current.time = Some(MoveTimeEntry {
                    elapsed_this_move: seconds,
                    elapsed_total: totals[side],
                });
            }
        }
        'V' | 'P' => {}
        _ => {
            trace!(line = line_no + 1, statement, "Skipping unknown statement");
            return Ok(false);
        }
    }

    Ok(true)
}
