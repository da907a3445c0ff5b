//! `TerminalReporter` — Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// - `step()` prints `"  → {message}"`, or updates the spinner when one is
///   attached
/// - `success()` prints `"  ✓ {message}"`
/// - `warn()` prints `"  ⚠ {message}"`
///
/// All three are suppressed when `ctx.quiet`.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    spinner: Option<ProgressBar>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx, spinner: None }
    }

    /// Like [`TerminalReporter::new`], with a spinner on TTYs.
    #[must_use]
    pub fn with_spinner(ctx: &'a OutputContext, msg: &str) -> Self {
        let spinner = ctx.show_progress().then(|| progress::spinner(msg));
        Self { ctx, spinner }
    }

    /// Stop the spinner, if any, with a final message.
    pub fn finish(&self, ok: bool, msg: &str) {
        match &self.spinner {
            Some(pb) if ok => progress::finish_ok(pb, msg),
            Some(pb) => progress::finish_error(pb),
            None if ok => self.ctx.success(msg),
            None => {}
        }
    }

    fn print(&self, f: impl FnOnce()) {
        match &self.spinner {
            Some(pb) => pb.suspend(f),
            None => f(),
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if self.ctx.quiet {
            return;
        }
        match &self.spinner {
            Some(pb) => pb.set_message(message.to_string()),
            None => println!("  {} {message}", "→".style(self.ctx.styles.header)),
        }
    }

    fn success(&self, message: &str) {
        self.print(|| self.ctx.success(message));
    }

    fn warn(&self, message: &str) {
        self.print(|| self.ctx.warn(message));
    }
}
