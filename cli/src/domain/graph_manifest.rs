//! Graph manifest (`langgraph.json`) inspection.
//!
//! The manifest is copied into the image verbatim; these types only read
//! enough of it to check that every graph points at a real file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::domain::error::GraphManifestError;

#[derive(Debug, Clone, Deserialize)]
pub struct GraphManifest {
    #[serde(default)]
    pub graphs: BTreeMap<String, String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Either a path to an env file or an inline map; passed through untouched.
    #[serde(default)]
    pub env: Option<Value>,
}

/// One `name → file.py:object` entry, split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphReference {
    pub graph: String,
    pub file: PathBuf,
    pub object: String,
}

impl GraphManifest {
    /// # Errors
    ///
    /// Returns `GraphManifestError::Parse` for malformed JSON.
    pub fn parse(content: &str) -> Result<Self, GraphManifestError> {
        serde_json::from_str(content).map_err(|e| GraphManifestError::Parse(e.to_string()))
    }

    /// Split every graph reference into file and object.
    ///
    /// # Errors
    ///
    /// Returns `GraphManifestError::NoGraphs` for an empty map, and
    /// `GraphManifestError::BadReference` for entries without `:object`.
    pub fn references(&self) -> Result<Vec<GraphReference>, GraphManifestError> {
        if self.graphs.is_empty() {
            return Err(GraphManifestError::NoGraphs);
        }
        self.graphs
            .iter()
            .map(|(graph, reference)| {
                let bad = || GraphManifestError::BadReference {
                    graph: graph.clone(),
                    reference: reference.clone(),
                };
                let (file, object) = reference.rsplit_once(':').ok_or_else(bad)?;
                if file.is_empty() || object.is_empty() {
                    return Err(bad());
                }
                Ok(GraphReference {
                    graph: graph.clone(),
                    file: normalize_relative(file),
                    object: object.to_string(),
                })
            })
            .collect()
    }
}

/// `./src/agent.py` → `src/agent.py`.
fn normalize_relative(file: &str) -> PathBuf {
    Path::new(file)
        .components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}
