//! `module:object` application identifiers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::error::ConfigError;

/// A dotted path of Python identifiers, e.g. `yield_agent.server`.
static DOTTED_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").expect("valid regex")
});

/// Reference to an importable module and a named object inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppIdentifier {
    module: String,
    object: String,
}

impl AppIdentifier {
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Attribute path inside the module (may itself be dotted).
    #[must_use]
    pub fn object(&self) -> &str {
        &self.object
    }

    /// Candidate source files for the module, relative to a source root.
    ///
    /// `a.b` may live in `a/b.py` or `a/b/__init__.py`.
    #[must_use]
    pub fn module_files(&self) -> [PathBuf; 2] {
        let base: PathBuf = self.module.split('.').collect();
        [base.with_extension("py"), base.join("__init__.py")]
    }
}

impl FromStr for AppIdentifier {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidAppIdentifier {
            value: s.to_string(),
            reason: reason.to_string(),
        };
        let (module, object) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| invalid("expected module:object"))?;
        if !DOTTED_PATH_RE.is_match(module) {
            return Err(invalid("module must be a dotted path of identifiers"));
        }
        if !DOTTED_PATH_RE.is_match(object) {
            return Err(invalid("object must be an identifier or attribute path"));
        }
        Ok(Self {
            module: module.to_string(),
            object: object.to_string(),
        })
    }
}

impl fmt::Display for AppIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.object)
    }
}

impl Serialize for AppIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AppIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
