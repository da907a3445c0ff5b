//! Berth CLI - build and run containerized ASGI agent servers

use std::process::ExitCode;

use berth_cli::cli::{self, Cli};
use berth_cli::domain::ConfigError;
use berth_cli::output::json;
use berth_common::env;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let as_json = args.json;

    // Runtime and gateway settings resolve from this snapshot only.
    let result = match env::capture(std::env::vars_os()) {
        Ok(env) => args.run(env).await,
        Err(e) => Err(ConfigError::from(e).into()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            let message = format!("{e:#}");
            match as_json
                .then(|| json::format_error(&message, cli::error_code(&e)))
                .transpose()
            {
                Ok(Some(obj)) => eprintln!("{obj}"),
                _ => eprintln!("Error: {message}"),
            }
            ExitCode::FAILURE
        }
    }
}
