//! Terminal output with optional termimad markdown styling.

use termimad::{crossterm::style::Color, MadSkin};

/// Prints markdown either styled or as plain text.
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();
        skin.set_headers_fg(Color::Blue);
        skin.bold.set_fg(Color::Yellow);
        skin.inline_code.set_bg(Color::AnsiValue(238));
        Self { rich_enabled, skin }
    }

    /// Prints `markdown` to stdout.
    pub fn render(&self, markdown: &str) {
        if !self.rich_enabled {
            print!("{markdown}");
            if !markdown.ends_with('\n') {
                println!();
            }
            return;
        }

        for line in markdown.lines() {
            if line.starts_with('#') {
                // Keep the hashes visible; termimad would strip them.
                println!("\x1b[34m{line}\x1b[0m");
            } else if line.contains("WARNING:") {
                println!("\x1b[33m{line}\x1b[0m");
            } else {
                self.skin.print_inline(line);
                println!();
            }
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}
