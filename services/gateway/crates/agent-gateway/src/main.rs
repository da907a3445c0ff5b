//! Standalone agent gateway server.
//!
//! Initialises tracing, captures the environment once, resolves `PORT`/`HOST`
//! and the `AGENT_*` settings from it via `envy`, and serves the gateway until
//! Ctrl-C.

use anyhow::{Context, Result};
use berth_common::GatewayConfig;
use berth_common::env::{self, DEFAULT_HOST, DEFAULT_PORT};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Raw listen settings (`PORT`, `HOST`); blank values count as unset.
#[derive(Debug, Default, Deserialize)]
struct ListenEnv {
    port: Option<String>,
    host: Option<String>,
}

/// Resolve the listen address from a captured environment.
fn listen_address(vars: &[(String, String)]) -> Result<(String, u16)> {
    let listen: ListenEnv =
        envy::from_iter(vars.iter().cloned()).context("invalid PORT or HOST")?;
    let port = env::port_setting(listen.port.as_deref())?.unwrap_or(DEFAULT_PORT);
    let host = listen
        .host
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    Ok((host, port))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let vars = env::capture(std::env::vars_os())?;
    let (host, port) = listen_address(&vars)?;
    let config: GatewayConfig =
        envy::from_iter(vars).context("invalid AGENT_* environment")?;

    let router = agent_gateway::app(&config)?;
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;

    tracing::info!(%host, port, "agent gateway listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("agent gateway shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) for graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}
