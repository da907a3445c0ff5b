//! Presentation layer: styled human output, spinners, and JSON documents.

pub mod json;
pub mod progress;
pub mod reporter;
pub mod styles;

use console::Term;
use owo_colors::OwoColorize as _;
pub use reporter::TerminalReporter;
pub use styles::Styles;

/// Where human-readable output goes and how it looks.
pub struct OutputContext {
    pub styles: Styles,
    /// Whether stdout is a terminal.
    pub is_tty: bool,
    /// Suppress everything except errors.
    pub quiet: bool,
}

impl OutputContext {
    /// Colors are used only on a terminal and only without `--no-color`.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let styles = if is_tty && !no_color {
            Styles::colored()
        } else {
            Styles::default()
        };
        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Spinners only make sense on an interactive, non-quiet terminal.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// `key: value` with the key dimmed and padded to a fixed column.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            let key = format!("{key}:");
            println!("    {:<17} {value}", key.style(self.styles.dim));
        }
    }
}
