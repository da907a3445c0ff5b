//! `berth serve` — host a compiled-in application on the resolved address.

use std::future::Future;
use std::process::ExitCode;

use anyhow::{Context, Result};
use berth_common::GatewayConfig;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::serve_service::AppRegistry;
use crate::commands::RuntimeArgs;
use crate::domain::{Lifecycle, Phase, RuntimeConfig};
use crate::infra::network::bind_listener;

/// Arguments for the serve command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub runtime: RuntimeArgs,
}

/// Run the serve command until Ctrl-C.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the application is unknown,
/// the port is taken, or the server fails.
pub async fn run(app: &AppContext, args: &ServeArgs) -> Result<ExitCode> {
    let config = app.runtime_config(&args.runtime.overrides())?;
    let gateway = app.gateway_config()?;
    let registry = AppRegistry::builtin();
    app.output.success(&format!(
        "serving {} on http://{}",
        config.app,
        config.bind_addr()
    ));
    serve_with_shutdown(&registry, &config, &gateway, shutdown_signal()).await?;
    Ok(ExitCode::SUCCESS)
}

/// Resolve, bind and serve until `shutdown` completes.
///
/// The application is resolved before the listener is bound, so an unknown
/// identifier never touches the port.
///
/// # Errors
///
/// Returns `LaunchError::UnknownApplication` or `LaunchError::PortInUse`, or
/// the server's I/O error.
pub async fn serve_with_shutdown<F>(
    registry: &AppRegistry,
    config: &RuntimeConfig,
    gateway: &GatewayConfig,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let mut lifecycle = Lifecycle::starting_at(Phase::Built);
    lifecycle.advance(Phase::Starting)?;

    let result = async {
        let router = registry.build(&config.app, gateway)?;
        let listener = bind_listener(config).await?;
        tracing::info!(addr = %config.bind_addr(), app = %config.app, "listening");
        lifecycle.advance(Phase::Serving)?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server error")
    }
    .await;

    lifecycle.terminate();
    tracing::info!("server shut down");
    result
}

/// Wait for SIGINT (Ctrl-C) for graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}
