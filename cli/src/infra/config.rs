//! Infrastructure implementation of the `BuildSpecStore` port.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::BuildSpecStore;
use crate::domain::BuildSpec;

/// Reads `berth.yaml` from disk.
pub struct YamlBuildSpecStore;

impl BuildSpecStore for YamlBuildSpecStore {
    fn load(&self, path: &Path) -> Result<Option<BuildSpec>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let spec = serde_yaml::from_str(&content)
            .with_context(|| format!("cannot parse {}", path.display()))?;
        Ok(Some(spec))
    }
}
