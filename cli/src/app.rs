//! Application context — unified state passed to every command handler.
//!
//! The process environment is captured once, here, and every configuration
//! value is resolved from that snapshot. Nothing downstream calls
//! `std::env::var` on its own.

use anyhow::{Context, Result};
use berth_common::GatewayConfig;

use crate::domain::{ConfigError, RuntimeConfig, RuntimeOverrides};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlBuildSpecStore;
use crate::infra::fs::LocalFs;
use crate::infra::network::TcpPortProbe;
use crate::output::OutputContext;

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Environment captured at start-up.
    pub env: Vec<(String, String)>,
    pub runner: TokioCommandRunner,
    pub fs: LocalFs,
    pub spec_store: YamlBuildSpecStore,
    pub port_probe: TcpPortProbe,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags and an environment
    /// snapshot.
    #[must_use]
    pub fn new(flags: &OutputFlags, env: Vec<(String, String)>) -> Self {
        let mode = if flags.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        // JSON mode keeps stdout for the single JSON document.
        let quiet = flags.quiet || flags.json;

        Self {
            output: OutputContext::new(flags.no_color, quiet),
            mode,
            env,
            runner: TokioCommandRunner::default(),
            fs: LocalFs,
            spec_store: YamlBuildSpecStore,
            port_probe: TcpPortProbe,
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Resolve runtime configuration from the snapshot plus CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an invalid port or application identifier.
    pub fn runtime_config(&self, overrides: &RuntimeOverrides) -> Result<RuntimeConfig, ConfigError> {
        let config = RuntimeConfig::resolve(self.env.iter().cloned(), overrides)?;
        tracing::debug!(
            host = %config.host,
            port = config.port,
            app = %config.app,
            "runtime configuration resolved"
        );
        Ok(config)
    }

    /// Gateway settings (`AGENT_*`) from the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable has the wrong type.
    pub fn gateway_config(&self) -> Result<GatewayConfig> {
        envy::from_iter(self.env.iter().cloned()).context("invalid AGENT_* environment")
    }
}
