//! `berth config` — show the resolved runtime configuration and build spec.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::application::services::spec_service::{self, LoadedSpec, SpecOrigin};
use crate::commands::{RuntimeArgs, SpecArgs};
use crate::domain::{RuntimeConfig, ValueSource};
use crate::output::json;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    #[command(flatten)]
    pub spec: SpecArgs,
}

#[derive(Serialize)]
struct ConfigView<'a> {
    runtime: &'a RuntimeConfig,
    build: Option<&'a LoadedSpec>,
    build_error: Option<String>,
}

/// Run the config command.
///
/// An invalid runtime configuration is an error. A missing or invalid build
/// spec is reported alongside the runtime values instead.
///
/// # Errors
///
/// Returns an error if the runtime configuration cannot be resolved.
pub fn run(app: &AppContext, args: &ConfigArgs) -> Result<ExitCode> {
    let runtime = app.runtime_config(&args.runtime.overrides())?;
    let build = spec_service::load_spec(&app.spec_store, &app.fs, &args.spec.request());
    let (build, build_error) = match &build {
        Ok(loaded) => (Some(loaded), None),
        Err(e) => (None, Some(format!("{e:#}"))),
    };

    if app.is_json() {
        json::print(&ConfigView {
            runtime: &runtime,
            build,
            build_error,
        })?;
        return Ok(ExitCode::SUCCESS);
    }

    render_runtime(app, &runtime);
    println!();
    match (build, build_error) {
        (Some(loaded), _) => render_build(app, loaded),
        (None, Some(err)) => app.output.warn(&format!("build spec: {err}")),
        (None, None) => {}
    }
    Ok(ExitCode::SUCCESS)
}

fn render_runtime(app: &AppContext, config: &RuntimeConfig) {
    let out = &app.output;
    out.header("Runtime");
    out.kv("host", &with_source(&config.host, config.sources.host));
    out.kv(
        "port",
        &with_source(&config.port.to_string(), config.sources.port),
    );
    out.kv(
        "source root",
        &with_source(
            &config.source_root.display().to_string(),
            config.sources.source_root,
        ),
    );
    out.kv("search path", &config.python_path_env());
    out.kv("app", &with_source(&config.app.to_string(), config.sources.app));
}

fn render_build(app: &AppContext, loaded: &LoadedSpec) {
    let out = &app.output;
    let spec = &loaded.spec;
    out.header("Build");
    let origin = match &loaded.origin {
        SpecOrigin::File { path } => path.display().to_string(),
        SpecOrigin::Detected { profile } => format!("detected ({profile})"),
    };
    out.kv("spec", &origin);
    out.kv("base image", &spec.base_image);
    out.kv("system packages", &spec.system_packages.join(" "));
    out.kv(
        "dependencies",
        &format!(
            "{} ({})",
            spec.dependencies.path().display(),
            spec.dependencies.profile()
        ),
    );
    out.kv("source dir", &spec.source_dir.display().to_string());
    out.kv("graph manifest", &spec.graph_manifest.display().to_string());
    out.kv("app", &spec.app.to_string());
    out.kv("tag", &spec.tag);
}

fn with_source(value: &str, source: ValueSource) -> String {
    format!("{value} ({})", source.as_str())
}
