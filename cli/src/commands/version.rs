//! Version command

use anyhow::Result;
use serde::Serialize;

use crate::output::json;

#[derive(Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
}

/// Run the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(as_json: bool) -> Result<()> {
    let info = VersionInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    };
    if as_json {
        json::print(&info)?;
    } else {
        println!("berth {}", info.version);
    }
    Ok(())
}
