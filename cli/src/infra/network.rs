//! Network infrastructure — listener probing and socket binding.

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use crate::application::ports::PortProbe;
use crate::domain::{LaunchError, RuntimeConfig};

/// Probes ports by binding and immediately releasing them.
pub struct TcpPortProbe;

impl PortProbe for TcpPortProbe {
    async fn is_available(&self, host: &str, port: u16) -> Result<bool> {
        match TcpListener::bind((host, port)).await {
            Ok(listener) => {
                drop(listener);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => Ok(false),
            Err(e) => Err(e).with_context(|| format!("cannot bind {host}:{port}")),
        }
    }
}

/// Bind the listener for `config`, mapping an occupied port to `PortInUse`.
///
/// # Errors
///
/// Returns `LaunchError::PortInUse` when the port is taken, or the I/O error
/// for any other bind failure.
pub async fn bind_listener(config: &RuntimeConfig) -> Result<TcpListener> {
    match TcpListener::bind((config.host.as_str(), config.port)).await {
        Ok(listener) => Ok(listener),
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => Err(LaunchError::PortInUse {
            host: config.host.clone(),
            port: config.port,
        }
        .into()),
        Err(e) => Err(e).with_context(|| format!("cannot bind {}", config.bind_addr())),
    }
}
