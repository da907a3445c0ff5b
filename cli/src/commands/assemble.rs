//! `berth assemble` — lay the image filesystem out in a local directory.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::{build_service, spec_service};
use crate::commands::SpecArgs;
use crate::domain::launch::DEFAULT_PYTHON;
use crate::output::{TerminalReporter, json};

/// Arguments for the assemble command.
#[derive(Args, Debug)]
pub struct AssembleArgs {
    #[command(flatten)]
    pub spec: SpecArgs,

    /// Output directory; must not exist yet
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Interpreter whose pip performs the install
    #[arg(long, default_value = DEFAULT_PYTHON)]
    pub python: String,
}

/// Run the assemble command.
///
/// # Errors
///
/// Returns an error if the spec cannot be loaded, the output directory
/// exists, or the installer fails. No partial output is left in any case.
pub async fn run(app: &AppContext, args: &AssembleArgs) -> Result<ExitCode> {
    let loaded = spec_service::load_spec(&app.spec_store, &app.fs, &args.spec.request())?;

    let reporter = TerminalReporter::with_spinner(
        &app.output,
        &format!("Assembling {}...", args.out.display()),
    );
    let result = build_service::assemble_dir(
        &app.runner,
        &app.fs,
        &reporter,
        &loaded,
        &args.out,
        &args.python,
    )
    .await;
    match &result {
        Ok(outcome) => {
            reporter.finish(true, &format!("Assembled {}", outcome.output.display()));
        }
        Err(_) => reporter.finish(false, ""),
    }
    let outcome = result?;

    if app.is_json() {
        json::print(&outcome)?;
    } else {
        app.output.kv("fingerprint", &outcome.fingerprint);
    }
    Ok(ExitCode::SUCCESS)
}
