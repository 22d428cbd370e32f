//! `history` command: the reconciled game list, oldest first

use colored::Colorize;
use prettytable::{format, row, Table};

use crate::config::Config;
use crate::error::Result;
use crate::game_list::{reconcile, LineLogParser, ListPolicy, ListWindow, LogParser};
use crate::source::{HttpRecordSource, RecordSource};
use crate::time_control::parse_game_id;

/// Fetch the game list and reconcile it in chronological order
///
/// # Errors
///
/// Returns error if no list URL is configured or the list cannot be fetched
pub async fn load_history(source: &dyn RecordSource, parser: &dyn LogParser) -> Result<ListWindow> {
    let log = source.fetch_list().await?;
    let entries = parser.parse(&log);
    tracing::debug!(entries = entries.len(), "Parsed game list");
    Ok(reconcile(entries, ListPolicy::Chronological))
}

/// Handle the `history` command
pub async fn handle_history(config: Config, json: bool) -> Result<()> {
    let source = HttpRecordSource::new(config)?;
    let window = load_history(&source, &LineLogParser).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&window.entries)?);
        return Ok(());
    }

    if window.is_empty() {
        println!("{}", "No games found.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row!["Started".bold(), "Game".bold(), "Time control".bold()]);

    for entry in &window.entries {
        let started = entry
            .started_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(row![
            started,
            entry.identity.game_name.cyan(),
            parse_game_id(&entry.identity.game_id)
        ]);
    }

    table.printstd();
    println!(
        "{} games. Use {} to follow one.",
        window.len(),
        "boardsync watch <GAME_ID>".cyan()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeSource;

    #[tokio::test]
    async fn test_load_history_is_chronological_and_deduplicated() {
        let source = FakeSource::new();
        source.set_list(
            "b+c-60-0+20230101130000 second\n\
             garbage line\n\
             a+c-60-0+20230101120000 first\n\
             b+c-60-0+20230101130000 second (renamed)\n",
        );

        let window = load_history(&source, &LineLogParser).await.unwrap();
        let names: Vec<&str> = window
            .entries
            .iter()
            .map(|e| e.identity.game_name.as_str())
            .collect();
        assert_eq!(names, vec!["first", "second (renamed)"]);
        assert_eq!(window.reference, None);
    }

    #[tokio::test]
    async fn test_load_history_propagates_fetch_errors() {
        let source = FakeSource::new();
        assert!(load_history(&source, &LineLogParser).await.is_err());
    }
}
