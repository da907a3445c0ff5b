//! Application service — start the external ASGI server process.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, PortProbe, ProgressReporter};
use crate::domain::launch::{DEFAULT_PYTHON, resolution_probe};
use crate::domain::{EntryStyle, LaunchCommand, LaunchError, Lifecycle, Phase, RuntimeConfig};

/// Exit code reported when the server was killed by a signal.
pub const SIGNALLED_EXIT_CODE: i32 = 1;

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub style: EntryStyle,
    pub python: String,
    /// Run the import and port probes before spawning.
    pub preflight: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            style: EntryStyle::Module,
            python: DEFAULT_PYTHON.to_string(),
            preflight: true,
        }
    }
}

/// Verify that the application object can be imported.
///
/// # Errors
///
/// Returns `LaunchError::AppResolution` if the interpreter cannot import the
/// module or the module lacks the object.
pub async fn check_app_resolves(
    runner: &impl CommandRunner,
    config: &RuntimeConfig,
    python: &str,
) -> Result<()> {
    let script = resolution_probe(&config.app);
    let env = [("PYTHONPATH".to_string(), config.python_path_env())];
    let output = runner
        .run_with_env(python, &["-c", &script], &env)
        .await
        .map_err(|e| LaunchError::AppResolution {
            app: config.app.to_string(),
            detail: format!("{e:#}"),
        })?;
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .map_or_else(
            || format!("{python} exited with {}", output.status),
            |l| l.trim().to_string(),
        );
    Err(LaunchError::AppResolution {
        app: config.app.to_string(),
        detail,
    }
    .into())
}

/// Fail when the configured port is already bound.
///
/// # Errors
///
/// Returns `LaunchError::PortInUse` when the port cannot be bound.
pub async fn check_port_available(probe: &impl PortProbe, config: &RuntimeConfig) -> Result<()> {
    let available = probe
        .is_available(&config.host, config.port)
        .await
        .with_context(|| format!("probing {}", config.bind_addr()))?;
    if available {
        Ok(())
    } else {
        Err(LaunchError::PortInUse {
            host: config.host.clone(),
            port: config.port,
        }
        .into())
    }
}

/// Run preflight checks, then the server in the foreground.
///
/// Returns the child's exit code. Nothing is retried or restarted.
///
/// # Errors
///
/// Returns an error if a preflight check fails or the server cannot be
/// spawned.
pub async fn launch(
    runner: &impl CommandRunner,
    probe: &impl PortProbe,
    reporter: &impl ProgressReporter,
    config: &RuntimeConfig,
    options: &LaunchOptions,
) -> Result<i32> {
    let mut lifecycle = Lifecycle::starting_at(Phase::Built);
    lifecycle.advance(Phase::Starting)?;

    let command = LaunchCommand::for_config(config, options.style, &options.python);
    let result = run_server(runner, probe, reporter, config, options, &command, &mut lifecycle).await;
    lifecycle.terminate();
    result
}

async fn run_server(
    runner: &impl CommandRunner,
    probe: &impl PortProbe,
    reporter: &impl ProgressReporter,
    config: &RuntimeConfig,
    options: &LaunchOptions,
    command: &LaunchCommand,
    lifecycle: &mut Lifecycle,
) -> Result<i32> {
    if options.preflight {
        reporter.step(&format!("resolving {}...", config.app));
        check_app_resolves(runner, config, &options.python).await?;
        check_port_available(probe, config).await?;
    } else {
        tracing::warn!("preflight checks skipped");
    }

    reporter.success(&format!("serving {} on {}", config.app, config.bind_addr()));
    tracing::info!(command = %command.display_line(), "starting server");
    lifecycle.advance(Phase::Serving)?;

    let args: Vec<&str> = command.args.iter().map(String::as_str).collect();
    let status = runner
        .run_status(&command.program, &args, &command.env)
        .await
        .with_context(|| format!("failed to start {}", command.program))?;

    let code = status.code().unwrap_or(SIGNALLED_EXIT_CODE);
    if code == 0 {
        tracing::info!("server exited cleanly");
    } else {
        tracing::warn!(code, "server exited with failure");
    }
    Ok(code)
}
