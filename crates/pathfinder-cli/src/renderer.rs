//! Terminal output for the `pf` binary.
//!
//! Markdown produced by the core display types goes through termimad when
//! color is enabled and is printed as-is otherwise.

use anyhow::Result;
use pathfinder_core::Session;
use termimad::{MadSkin, crossterm::style::Color};

const BAR_WIDTH: usize = 20;

/// Prints markdown and progress lines, with or without styling.
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();
        skin.set_headers_fg(Color::Cyan);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::DarkGrey);
        skin.inline_code.set_bg(Color::AnsiValue(238));

        Self { rich_enabled, skin }
    }

    /// Prints a markdown document.
    pub fn render(&self, markdown: &str) -> Result<()> {
        if !self.rich_enabled {
            print!("{markdown}");
            return Ok(());
        }

        // Headers keep their hashes so nesting stays visible
        for line in markdown.lines() {
            if line.starts_with('#') {
                println!("\x1b[36m{line}\x1b[0m");
            } else {
                self.skin.print_inline(line);
                println!();
            }
        }
        Ok(())
    }

    /// Prints one line describing where a running session is.
    pub fn progress(&self, session: &Session) {
        let line = progress_line(session);
        if self.rich_enabled {
            self.skin.print_inline(&line);
            println!();
        } else {
            println!("{line}");
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

/// `[#####---------------] 25% market_research (active)`
fn progress_line(session: &Session) -> String {
    let filled = usize::from(session.progress.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}% {} ({})",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        session.progress,
        session.current_step,
        session.status
    )
}
