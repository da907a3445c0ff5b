//! `berth build` — build and tag the container image.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::{build_service, spec_service};
use crate::commands::SpecArgs;
use crate::output::{TerminalReporter, json};

/// Arguments for the build command.
#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub spec: SpecArgs,

    /// Image tag, overrides the build spec
    #[arg(short, long)]
    pub tag: Option<String>,
}

/// Run the build command.
///
/// # Errors
///
/// Returns an error if the spec cannot be loaded or `docker build` fails.
pub async fn run(app: &AppContext, args: &BuildArgs) -> Result<ExitCode> {
    let mut loaded = spec_service::load_spec(&app.spec_store, &app.fs, &args.spec.request())?;
    if let Some(tag) = &args.tag {
        loaded.spec.tag.clone_from(tag);
        loaded.spec.validate()?;
    }

    let reporter =
        TerminalReporter::with_spinner(&app.output, &format!("Building {}...", loaded.spec.tag));
    let result = build_service::build_image(&app.runner, &app.fs, &reporter, &loaded).await;
    match &result {
        Ok(outcome) => reporter.finish(true, &format!("Built {}", outcome.tag)),
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
