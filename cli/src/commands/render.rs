//! `berth render` — print the container build recipe without building.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::application::services::build_service::{self, BuildPlan};
use crate::application::services::spec_service::{self, LoadedSpec};
use crate::commands::SpecArgs;
use crate::output::json;

/// Arguments for the render command.
#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub spec: SpecArgs,
}

#[derive(Serialize)]
struct RenderView<'a> {
    spec: &'a LoadedSpec,
    #[serde(flatten)]
    plan: &'a BuildPlan,
}

/// Run the render command.
///
/// Human mode prints only the Dockerfile so the output can be piped into
/// `docker build -f -`.
///
/// # Errors
///
/// Returns an error if the spec cannot be loaded or the project tree cannot
/// be read.
pub fn run(app: &AppContext, args: &RenderArgs) -> Result<ExitCode> {
    let loaded = spec_service::load_spec(&app.spec_store, &app.fs, &args.spec.request())?;
    let plan = build_service::plan(&app.fs, &loaded)?;

    if app.is_json() {
        json::print(&RenderView {
            spec: &loaded,
            plan: &plan,
        })?;
    } else {
        print!("{}", plan.dockerfile);
    }
    Ok(ExitCode::SUCCESS)
}
