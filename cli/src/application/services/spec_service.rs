//! Application service — locate and validate the build spec.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::application::ports::{BuildSpecStore, ProjectFs};
use crate::domain::build_spec::{PROJECT_FILE, REQUIREMENTS_FILE, SPEC_FILE, select_profile};
use crate::domain::{BuildError, BuildProfile, BuildSpec};

/// Where the spec came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpecOrigin {
    File { path: PathBuf },
    Detected { profile: BuildProfile },
}

/// A validated spec together with the project directory it is relative to.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedSpec {
    pub root: PathBuf,
    pub spec: BuildSpec,
    pub origin: SpecOrigin,
}

impl LoadedSpec {
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(self.spec.dependencies.path())
    }

    #[must_use]
    pub fn source_path(&self) -> PathBuf {
        self.root.join(&self.spec.source_dir)
    }

    #[must_use]
    pub fn graph_manifest_path(&self) -> PathBuf {
        self.root.join(&self.spec.graph_manifest)
    }
}

/// How the caller wants the spec located.
#[derive(Debug, Clone, Default)]
pub struct SpecRequest {
    pub root: PathBuf,
    /// Explicit spec file (`--config` / `BERTH_CONFIG`); must exist.
    pub spec_file: Option<PathBuf>,
    pub profile: Option<BuildProfile>,
    /// Overrides the graph manifest path (`GRAPH_MANIFEST`).
    pub graph_manifest: Option<PathBuf>,
}

/// Load `berth.yaml` if present, otherwise detect the spec from the project.
///
/// # Errors
///
/// Returns an error if an explicit spec file is missing, the spec is invalid,
/// the requested profile conflicts with the spec, or no single dependency
/// manifest can be chosen.
pub fn load_spec(
    store: &impl BuildSpecStore,
    fs: &impl ProjectFs,
    request: &SpecRequest,
) -> Result<LoadedSpec> {
    let root = request.root.clone();
    let spec_path = request
        .spec_file
        .clone()
        .unwrap_or_else(|| root.join(SPEC_FILE));

    let (mut spec, origin) = match store.load(&spec_path)? {
        Some(spec) => {
            if let Some(requested) = request.profile {
                let declared = spec.dependencies.profile();
                if requested != declared {
                    return Err(BuildError::ProfileConflict {
                        requested: requested.as_str(),
                        declared: declared.as_str(),
                    }
                    .into());
                }
            }
            tracing::debug!(path = %spec_path.display(), "loaded build spec");
            (spec, SpecOrigin::File { path: spec_path })
        }
        None if request.spec_file.is_some() => {
            anyhow::bail!("Build spec not found: {}", spec_path.display());
        }
        None => {
            let profile = detect_profile(fs, &root, request.profile)?;
            tracing::debug!(%profile, "detected dependency profile");
            (BuildSpec::detected(profile), SpecOrigin::Detected { profile })
        }
    };

    if let Some(graph) = &request.graph_manifest {
        spec.graph_manifest.clone_from(graph);
    }
    spec.validate()?;

    let loaded = LoadedSpec { root, spec, origin };
    let manifest = loaded.manifest_path();
    if !fs.exists(&manifest) {
        return Err(BuildError::ManifestNotFound(manifest).into());
    }
    Ok(loaded)
}

fn detect_profile(
    fs: &impl ProjectFs,
    root: &Path,
    requested: Option<BuildProfile>,
) -> Result<BuildProfile, BuildError> {
    select_profile(
        requested,
        fs.exists(&root.join(REQUIREMENTS_FILE)),
        fs.exists(&root.join(PROJECT_FILE)),
        root,
    )
}
