//! `berth launch` — run the ASGI server in the foreground.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::launch_service::{self, LaunchOptions};
use crate::commands::RuntimeArgs;
use crate::domain::launch::DEFAULT_PYTHON;
use crate::domain::{EntryStyle, LaunchCommand};
use crate::output::{TerminalReporter, json};

/// Arguments for the launch command.
#[derive(Args, Debug)]
pub struct LaunchArgs {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    /// How the server is started: `python -m uvicorn` or the `uvicorn` script
    #[arg(long, default_value_t = EntryStyle::Module, value_name = "module|binary")]
    pub entry: EntryStyle,

    /// Interpreter used for the import check and module entry
    #[arg(long, default_value = DEFAULT_PYTHON)]
    pub python: String,

    /// Skip the application import and port checks
    #[arg(long)]
    pub no_preflight: bool,

    /// Print the resolved command without running it
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the launch command; the exit code is the server's.
///
/// # Errors
///
/// Returns an error if configuration is invalid, a preflight check fails, or
/// the server cannot be spawned.
pub async fn run(app: &AppContext, args: &LaunchArgs) -> Result<ExitCode> {
    let config = app.runtime_config(&args.runtime.overrides())?;

    if args.dry_run {
        let command = LaunchCommand::for_config(&config, args.entry, &args.python);
        if app.is_json() {
            json::print(&command)?;
        } else {
            for (key, value) in &command.env {
                println!("{key}={value}");
            }
            println!("{}", command.display_line());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let options = LaunchOptions {
        style: args.entry,
        python: args.python.clone(),
        preflight: !args.no_preflight,
    };
    let reporter = TerminalReporter::new(&app.output);
    let code =
        launch_service::launch(&app.runner, &app.port_probe, &reporter, &config, &options).await?;
    Ok(exit_code(code))
}

/// Map a child exit code onto the process exit code.
fn exit_code(code: i32) -> ExitCode {
    match u8::try_from(code) {
        Ok(code) => ExitCode::from(code),
        Err(_) => ExitCode::FAILURE,
    }
}
