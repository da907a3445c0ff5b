//! Spinners for long-running build steps (indicatif).

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "];

/// Template-based style; falls back to indicatif's default spinner if the
/// template is rejected.
fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Start a ticking spinner showing `msg` and the elapsed time.
#[must_use]
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(style("  {spinner:.cyan} {msg} {elapsed:.dim}").tick_strings(TICKS));
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Replace the spinner with `✓ msg`.
pub fn finish_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(style("  {prefix:.green} {msg}"));
    pb.set_prefix("✓");
    pb.finish_with_message(msg.to_string());
}

/// Remove the spinner line; the error itself is printed by `main`.
pub fn finish_error(pb: &ProgressBar) {
    pb.finish_and_clear();
}
