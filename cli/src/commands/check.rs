//! `berth check` — validate a project without building it.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize as _;
use serde::Serialize;

use crate::app::AppContext;
use crate::application::services::check_service::{self, CheckReport, CheckStatus};
use crate::commands::SpecArgs;
use crate::output::{OutputContext, json};

/// Arguments for the check command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub spec: SpecArgs,
}

#[derive(Serialize)]
struct CheckView<'a> {
    ok: bool,
    #[serde(flatten)]
    report: &'a CheckReport,
}

/// Run the check command. Exits non-zero when any check reports an error.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(app: &AppContext, args: &CheckArgs) -> Result<ExitCode> {
    let report = check_service::check_project(&app.spec_store, &app.fs, &args.spec.request());

    if app.is_json() {
        json::print(&CheckView {
            ok: !report.has_errors(),
            report: &report,
        })?;
    } else {
        render(&app.output, &report);
    }

    Ok(if report.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn render(ctx: &OutputContext, report: &CheckReport) {
    println!();
    println!("  {}", "Project Check".style(ctx.styles.header));
    println!();
    for item in &report.checks {
        let mark = ctx.styles.status_mark(item.status);
        println!("    {mark} {}: {}", item.name, item.detail);
    }
    println!();

    let errors = report.count(CheckStatus::Error);
    let warnings = report.count(CheckStatus::Warn);
    if errors == 0 && warnings == 0 {
        println!("  {} Everything looks good!", "✓".style(ctx.styles.success));
    } else {
        println!(
            "  {} error(s), {} warning(s)",
            errors.style(ctx.styles.error),
            warnings.style(ctx.styles.warning)
        );
    }
    println!();
}
