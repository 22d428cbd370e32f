//! Plain terminal renderer
//!
//! Prints one block per update: the game header, the shown move with its
//! score and both clocks, the move's comments, and the canonical link.

use colored::Colorize;

use crate::session::BoardRenderer;
use crate::view::BoardView;

/// [`BoardRenderer`] writing to stdout
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    /// Label prepended to every line, used when several boards share stdout
    prefix: Option<String>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

impl BoardRenderer for TerminalRenderer {
    fn render(&mut self, view: &BoardView) {
        for line in format_view(view).lines() {
            match &self.prefix {
                Some(prefix) => println!("[{}] {}", prefix.cyan(), line),
                None => println!("{}", line),
            }
        }
    }

    fn release(&mut self) {
        if let Some(prefix) = &self.prefix {
            println!("[{}] {}", prefix.cyan(), "board closed".dimmed());
        }
    }
}

/// Text block for one view
pub fn format_view(view: &BoardView) -> String {
    let mut out = format!(
        "{} ({})\n",
        view.identity.game_name.bold(),
        view.time_control
    );

    let clocks = view.clock_labels(view.ply);
    let current = view.current();
    let notation = current
        .and_then(|mv| mv.notation.as_deref())
        .unwrap_or("start");
    let mut status = format!("ply {}/{} {}", view.ply, view.max_ply(), notation);

    if let Some(score) = current.and_then(|mv| mv.score) {
        let label = format!("{:+}", score);
        let label = if score >= 0 { label.green() } else { label.red() };
        status.push_str(&format!(" score {}", label));
    }
    if let (Some(black), Some(white)) = (&clocks.black, &clocks.white) {
        status.push_str(&format!(" | black {} white {}", black, white));
    }
    out.push_str(&status);
    out.push('\n');

    if let Some(mv) = current {
        for line in mv.comment_text.lines() {
            out.push_str(&format!("  {}\n", line.dimmed()));
        }
    }
    if let Some(link) = &view.canonical_link {
        out.push_str(&format!("{}\n", link.underline()));
    }
    if view.terminal {
        out.push_str(&format!("{}\n", "game over".yellow()));
    }

    out
}
