//! Environment capture and the listen-port rule shared by the berth binaries.
//!
//! Both binaries snapshot the process environment once with [`capture`] and
//! resolve settings from that snapshot, never from `std::env` directly.

use std::ffi::OsString;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Variables that carry a setting, besides the `AGENT_` family.
const SETTING_KEYS: &[&str] = &["PORT", "HOST", "APP_MODULE", "APP_SOURCE_ROOT", "PYTHONPATH"];
const SETTING_PREFIX: &str = "AGENT_";

/// A setting variable whose value is not valid Unicode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{key} is set to a value that is not valid Unicode")]
pub struct NotUnicode {
    pub key: String,
}

/// A `PORT` value outside `1..=65535`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid PORT '{value}': {reason}")]
pub struct InvalidPort {
    pub value: String,
    pub reason: &'static str,
}

/// True for variables read as settings.
#[must_use]
pub fn is_setting(key: &str) -> bool {
    SETTING_KEYS.contains(&key) || key.starts_with(SETTING_PREFIX)
}

/// Snapshot an environment as UTF-8 pairs.
///
/// Unrelated variables that are not Unicode are dropped.
///
/// # Errors
///
/// Returns [`NotUnicode`] when a setting variable cannot be decoded, so a
/// garbled `PORT` is never mistaken for an unset one.
pub fn capture<I>(vars: I) -> Result<Vec<(String, String)>, NotUnicode>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut env = Vec::new();
    for (key, value) in vars {
        let Ok(key) = key.into_string() else {
            continue;
        };
        match value.into_string() {
            Ok(value) => env.push((key, value)),
            Err(_) if is_setting(&key) => return Err(NotUnicode { key }),
            Err(_) => {}
        }
    }
    Ok(env)
}

/// Parse a `PORT` value. Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns [`InvalidPort`] for non-numeric, zero, or out-of-range values.
pub fn parse_port(raw: &str) -> Result<u16, InvalidPort> {
    let invalid = |reason| InvalidPort {
        value: raw.to_string(),
        reason,
    };
    let n: u64 = raw.trim().parse().map_err(|_| invalid("not a number"))?;
    match u16::try_from(n) {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(invalid("must be between 1 and 65535")),
    }
}

/// Reject port 0 given as an already-typed value.
///
/// # Errors
///
/// Returns [`InvalidPort`] for 0.
pub fn check_port(port: u16) -> Result<u16, InvalidPort> {
    parse_port(&port.to_string())
}

/// The port an environment asks for. Unset and blank both mean `None`.
///
/// # Errors
///
/// Returns [`InvalidPort`] when a non-blank value does not parse.
pub fn port_setting(raw: Option<&str>) -> Result<Option<u16>, InvalidPort> {
    raw.filter(|v| !v.trim().is_empty())
        .map(parse_port)
        .transpose()
}
