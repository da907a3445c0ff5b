//! Runtime configuration — resolved once from a captured environment.
//!
//! Pure functions only — no I/O, no async, no filesystem access. The caller
//! snapshots the process environment at start-up and passes it in; nothing
//! below reads `std::env`.

use std::path::PathBuf;

use berth_common::env::{check_port, port_setting};
use serde::{Deserialize, Serialize};

use crate::domain::app_id::AppIdentifier;
use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub use berth_common::env::{DEFAULT_HOST, DEFAULT_PORT};
/// Source root inside the image; also the default import search path entry.
pub const DEFAULT_SOURCE_ROOT: &str = "/app/src";
pub const DEFAULT_APP: &str = "yield_agent.server:app";

// ── Inputs ───────────────────────────────────────────────────────────────────

/// Raw environment values, as `envy` sees them (`PORT` → `port`, ...).
#[derive(Debug, Default, Deserialize)]
struct RuntimeEnv {
    port: Option<String>,
    host: Option<String>,
    app_source_root: Option<String>,
    app_module: Option<String>,
    pythonpath: Option<String>,
}

/// Values given on the command line; they win over the environment.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOverrides {
    pub port: Option<u16>,
    pub host: Option<String>,
    pub app: Option<String>,
    pub source_root: Option<PathBuf>,
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    Environment,
    Flag,
}

impl ValueSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Environment => "environment",
            Self::Flag => "flag",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigSources {
    pub host: ValueSource,
    pub port: ValueSource,
    pub source_root: ValueSource,
    pub app: ValueSource,
}

// ── Resolved configuration ───────────────────────────────────────────────────

/// Validated runtime configuration for one server process.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeConfig {
    pub host: String,
    pub port: u16,
    pub source_root: PathBuf,
    /// Import search path, source root first.
    pub python_path: Vec<String>,
    pub app: AppIdentifier,
    pub sources: ConfigSources,
}

impl RuntimeConfig {
    /// Resolve configuration from an environment snapshot plus CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPort` when `PORT` is set to anything other
    /// than an integer in `1..=65535`, and `ConfigError::InvalidAppIdentifier`
    /// when the application identifier is malformed.
    pub fn resolve<I>(env: I, overrides: &RuntimeOverrides) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env: RuntimeEnv =
            envy::from_iter(env).map_err(|e| ConfigError::Environment(e.to_string()))?;

        let (port, port_src) = match overrides.port {
            Some(port) => (check_port(port)?, ValueSource::Flag),
            None => match port_setting(env.port.as_deref())? {
                Some(port) => (port, ValueSource::Environment),
                None => (DEFAULT_PORT, ValueSource::Default),
            },
        };

        let (host, host_src) = pick(
            overrides.host.as_deref(),
            non_empty(env.host.as_deref()),
            DEFAULT_HOST,
        );

        let source_override = overrides
            .source_root
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());
        let (source_root, source_src) = pick(
            source_override.as_deref(),
            non_empty(env.app_source_root.as_deref()),
            DEFAULT_SOURCE_ROOT,
        );

        let (app, app_src) = pick(
            overrides.app.as_deref(),
            non_empty(env.app_module.as_deref()),
            DEFAULT_APP,
        );
        let app: AppIdentifier = app.parse()?;

        let python_path = search_path(&source_root, env.pythonpath.as_deref());

        Ok(Self {
            host,
            port,
            source_root: PathBuf::from(source_root),
            python_path,
            app,
            sources: ConfigSources {
                host: host_src,
                port: port_src,
                source_root: source_src,
                app: app_src,
            },
        })
    }

    /// `host:port` suitable for binding; IPv6 hosts are bracketed.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Value for the `PYTHONPATH` variable of the server process.
    #[must_use]
    pub fn python_path_env(&self) -> String {
        self.python_path.join(":")
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Parse a `PORT` value. Never falls back to the default.
///
/// # Errors
///
/// Returns `ConfigError::InvalidPort` for non-numeric or out-of-range values.
pub fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    Ok(berth_common::env::parse_port(raw)?)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn pick(flag: Option<&str>, env: Option<&str>, default: &str) -> (String, ValueSource) {
    match (flag, env) {
        (Some(v), _) => (v.trim().to_string(), ValueSource::Flag),
        (None, Some(v)) => (v.trim().to_string(), ValueSource::Environment),
        (None, None) => (default.to_string(), ValueSource::Default),
    }
}

/// Source root first, then any inherited entries (deduplicated, empties dropped).
fn search_path(source_root: &str, inherited: Option<&str>) -> Vec<String> {
    let mut entries = vec![source_root.to_string()];
    for entry in inherited.unwrap_or_default().split(':') {
        if !entry.is_empty() && !entries.iter().any(|e| e == entry) {
            entries.push(entry.to_string());
        }
    }
    entries
}

// ── Unit tests ───────────────────────────────────────────────────────────────
