//! Server process command lines.
//!
//! The ASGI server can be started as a module of the interpreter or through
//! its console script. Both forms receive identical server arguments.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::app_id::AppIdentifier;
use crate::domain::config::RuntimeConfig;

pub const ASGI_SERVER: &str = "uvicorn";
pub const DEFAULT_PYTHON: &str = "python";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStyle {
    /// `python -m uvicorn ...`
    #[default]
    Module,
    /// `uvicorn ...`
    Binary,
}

impl EntryStyle {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Binary => "binary",
        }
    }
}

impl fmt::Display for EntryStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "module" => Ok(Self::Module),
            "binary" => Ok(Self::Binary),
            other => Err(format!("unknown entry style '{other}' (expected module or binary)")),
        }
    }
}

/// A fully resolved server command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment for the child; everything else is inherited.
    pub env: Vec<(String, String)>,
}

impl LaunchCommand {
    #[must_use]
    pub fn for_config(config: &RuntimeConfig, style: EntryStyle, python: &str) -> Self {
        let (program, mut args) = match style {
            EntryStyle::Module => (
                python.to_string(),
                vec!["-m".to_string(), ASGI_SERVER.to_string()],
            ),
            EntryStyle::Binary => (ASGI_SERVER.to_string(), Vec::new()),
        };
        args.extend(server_args(config));
        Self {
            program,
            args,
            env: vec![("PYTHONPATH".to_string(), config.python_path_env())],
        }
    }

    /// Shell-like rendering for logs and `--dry-run`.
    #[must_use]
    pub fn display_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Arguments after the server program, shared by every entry style.
#[must_use]
pub fn server_args(config: &RuntimeConfig) -> Vec<String> {
    vec![
        config.app.to_string(),
        "--host".to_string(),
        config.host.clone(),
        "--port".to_string(),
        config.port.to_string(),
    ]
}

/// Python snippet that imports the module and checks the attribute path.
///
/// Exits 1 with a one-line reason on stderr when resolution fails.
#[must_use]
pub fn resolution_probe(app: &AppIdentifier) -> String {
    format!(
        "import importlib, sys\n\
         try:\n    obj = importlib.import_module({module:?})\n\
         except Exception as exc:\n    sys.exit(f'cannot import module {module}: {{exc}}')\n\
         for part in {parts:?}:\n    \
         if not hasattr(obj, part):\n        \
         sys.exit('module {module} has no attribute {object}')\n    \
         obj = getattr(obj, part)\n",
        module = app.module(),
        object = app.object(),
        parts = app.object().split('.').collect::<Vec<_>>(),
    )
}
