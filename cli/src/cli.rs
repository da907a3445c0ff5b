//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::builder::FalseyValueParser;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, OutputFlags};
use crate::commands;
use crate::domain::{BuildError, ConfigError, GraphManifestError, LaunchError, LifecycleError};

/// Build and run containerized ASGI agent servers
#[derive(Parser)]
#[command(
    name = "berth",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = FalseyValueParser::new()
    )]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build and tag the container image
    Build(commands::build::BuildArgs),

    /// Lay the image filesystem out in a local directory
    Assemble(commands::assemble::AssembleArgs),

    /// Print the Dockerfile without building
    Render(commands::render::RenderArgs),

    /// Validate the project without building
    Check(commands::check::CheckArgs),

    /// Show resolved runtime configuration and build spec
    Config(commands::config::ConfigArgs),

    /// Run the ASGI server in the foreground
    Launch(commands::launch::LaunchArgs),

    /// Serve a compiled-in application
    Serve(commands::serve::ServeArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command against a captured environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self, env: Vec<(String, String)>) -> Result<ExitCode> {
        let Cli {
            no_color,
            quiet,
            json,
            command,
        } = self;
        let app = AppContext::new(
            &OutputFlags {
                no_color,
                quiet,
                json,
            },
            env,
        );

        match command {
            Command::Build(args) => commands::build::run(&app, &args).await,
            Command::Assemble(args) => commands::assemble::run(&app, &args).await,
            Command::Render(args) => commands::render::run(&app, &args),
            Command::Check(args) => commands::check::run(&app, &args),
            Command::Config(args) => commands::config::run(&app, &args),
            Command::Launch(args) => commands::launch::run(&app, &args).await,
            Command::Serve(args) => commands::serve::run(&app, &args).await,
            Command::Version => {
                commands::version::run(json)?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

/// Short machine-readable code for a failure, used in JSON error objects.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if err.downcast_ref::<ConfigError>().is_some() {
        "config"
    } else if err.downcast_ref::<BuildError>().is_some() {
        "build"
    } else if err.downcast_ref::<GraphManifestError>().is_some() {
        "graph_manifest"
    } else if err.downcast_ref::<LaunchError>().is_some() {
        "launch"
    } else if err.downcast_ref::<LifecycleError>().is_some() {
        "lifecycle"
    } else {
        "error"
    }
}
