//! Build specification — what goes into the image.
//!
//! A `BuildSpec` is loaded from `berth.yaml` or synthesized from the files
//! present in the project directory. All paths are relative to that
//! directory; nothing here touches the filesystem.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::app_id::AppIdentifier;
use crate::domain::config::DEFAULT_APP;
use crate::domain::error::BuildError;

// ── Defaults ─────────────────────────────────────────────────────────────────

pub const DEFAULT_BASE_IMAGE: &str = "python:3.11-slim";
pub const DEFAULT_SYSTEM_PACKAGES: &[&str] = &["build-essential"];
pub const DEFAULT_SOURCE_DIR: &str = "src";
pub const DEFAULT_GRAPH_MANIFEST: &str = "langgraph.json";
pub const DEFAULT_TAG: &str = "yield-agent:latest";
/// ASGI server and web framework, always installed next to project metadata.
pub const DEFAULT_EXTRA_PACKAGES: &[&str] = &["uvicorn", "fastapi"];

pub const REQUIREMENTS_FILE: &str = "requirements.txt";
pub const PROJECT_FILE: &str = "pyproject.toml";
pub const SPEC_FILE: &str = "berth.yaml";

static APT_PACKAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z0-9][a-z0-9+.\-]+(=[A-Za-z0-9.+~:\-]+)?$").expect("valid regex")
});

/// `name[:tag]`, lowercase repository path components.
static IMAGE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z0-9]+([._\-/][a-z0-9]+)*(:[A-Za-z0-9_][A-Za-z0-9_.\-]{0,127})?$")
        .expect("valid regex")
});

// ── Dependency manifest ──────────────────────────────────────────────────────

/// The two accepted ways of declaring third-party packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DependencyManifest {
    /// Flat requirement list, one requirement per line.
    Requirements {
        #[serde(default = "default_requirements_path")]
        path: PathBuf,
    },
    /// Project metadata installed as a package, plus extra packages.
    Project {
        #[serde(default = "default_project_path")]
        path: PathBuf,
        #[serde(default = "default_extra_packages")]
        extra_packages: Vec<String>,
    },
}

fn default_requirements_path() -> PathBuf {
    PathBuf::from(REQUIREMENTS_FILE)
}

fn default_project_path() -> PathBuf {
    PathBuf::from(PROJECT_FILE)
}

fn default_extra_packages() -> Vec<String> {
    DEFAULT_EXTRA_PACKAGES.iter().map(ToString::to_string).collect()
}

impl DependencyManifest {
    #[must_use]
    pub fn for_profile(profile: BuildProfile) -> Self {
        match profile {
            BuildProfile::Requirements => Self::Requirements {
                path: default_requirements_path(),
            },
            BuildProfile::Project => Self::Project {
                path: default_project_path(),
                extra_packages: default_extra_packages(),
            },
        }
    }

    /// Manifest file, relative to the project directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Requirements { path } | Self::Project { path, .. } => path,
        }
    }

    #[must_use]
    pub fn profile(&self) -> BuildProfile {
        match self {
            Self::Requirements { .. } => BuildProfile::Requirements,
            Self::Project { .. } => BuildProfile::Project,
        }
    }
}

/// Mutually exclusive dependency profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildProfile {
    Requirements,
    Project,
}

impl BuildProfile {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requirements => "requirements",
            Self::Project => "project",
        }
    }
}

impl fmt::Display for BuildProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requirements" => Ok(Self::Requirements),
            "project" => Ok(Self::Project),
            other => Err(format!("unknown profile '{other}' (expected requirements or project)")),
        }
    }
}

/// Pick the dependency profile from the files present in the project.
///
/// # Errors
///
/// Returns `BuildError::NoManifest` when neither file exists, and
/// `BuildError::AmbiguousProfile` when both exist and no profile was requested.
pub fn select_profile(
    requested: Option<BuildProfile>,
    has_requirements: bool,
    has_project: bool,
    root: &Path,
) -> Result<BuildProfile, BuildError> {
    match (requested, has_requirements, has_project) {
        (Some(BuildProfile::Requirements), true, _) => Ok(BuildProfile::Requirements),
        (Some(BuildProfile::Project), _, true) => Ok(BuildProfile::Project),
        (Some(BuildProfile::Requirements), false, _) => {
            Err(BuildError::ManifestNotFound(root.join(REQUIREMENTS_FILE)))
        }
        (Some(BuildProfile::Project), _, false) => {
            Err(BuildError::ManifestNotFound(root.join(PROJECT_FILE)))
        }
        (None, true, false) => Ok(BuildProfile::Requirements),
        (None, false, true) => Ok(BuildProfile::Project),
        (None, true, true) => Err(BuildError::AmbiguousProfile(root.to_path_buf())),
        (None, false, false) => Err(BuildError::NoManifest(root.to_path_buf())),
    }
}

// ── Build spec ───────────────────────────────────────────────────────────────

/// Declarative description of the build stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSpec {
    #[serde(default = "default_base_image")]
    pub base_image: String,
    #[serde(default = "default_system_packages")]
    pub system_packages: Vec<String>,
    pub dependencies: DependencyManifest,
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    #[serde(default = "default_graph_manifest")]
    pub graph_manifest: PathBuf,
    #[serde(default = "default_app")]
    pub app: AppIdentifier,
    #[serde(default = "default_tag")]
    pub tag: String,
}

fn default_base_image() -> String {
    DEFAULT_BASE_IMAGE.to_string()
}

fn default_system_packages() -> Vec<String> {
    DEFAULT_SYSTEM_PACKAGES.iter().map(ToString::to_string).collect()
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SOURCE_DIR)
}

fn default_graph_manifest() -> PathBuf {
    PathBuf::from(DEFAULT_GRAPH_MANIFEST)
}

#[allow(clippy::expect_used)] // constant identifier
fn default_app() -> AppIdentifier {
    DEFAULT_APP.parse().expect("default app identifier is valid")
}

fn default_tag() -> String {
    DEFAULT_TAG.to_string()
}

impl BuildSpec {
    /// Spec with all defaults for the given dependency profile.
    #[must_use]
    pub fn detected(profile: BuildProfile) -> Self {
        Self {
            base_image: default_base_image(),
            system_packages: default_system_packages(),
            dependencies: DependencyManifest::for_profile(profile),
            source_dir: default_source_dir(),
            graph_manifest: default_graph_manifest(),
            app: default_app(),
            tag: default_tag(),
        }
    }

    /// File name the graph manifest takes at the image root.
    #[must_use]
    pub fn graph_manifest_name(&self) -> String {
        self.graph_manifest
            .file_name()
            .map_or_else(|| DEFAULT_GRAPH_MANIFEST.to_string(), |n| n.to_string_lossy().into_owned())
    }

    /// Check every field, reporting all problems at once.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::InvalidSpec` listing each invalid field.
    pub fn validate(&self) -> Result<(), BuildError> {
        let mut issues = Vec::new();

        if self.base_image.trim().is_empty() || self.base_image.contains(char::is_whitespace) {
            issues.push(format!("base_image: '{}' is not an image reference", self.base_image));
        }
        for pkg in &self.system_packages {
            if !APT_PACKAGE_RE.is_match(pkg) {
                issues.push(format!("system_packages: '{pkg}' is not a package name"));
            }
        }
        if !IMAGE_TAG_RE.is_match(&self.tag) {
            issues.push(format!("tag: '{}' is not a valid image tag", self.tag));
        }
        for (field, path) in [
            ("dependencies.path", self.dependencies.path()),
            ("source_dir", self.source_dir.as_path()),
            ("graph_manifest", self.graph_manifest.as_path()),
        ] {
            if let Some(problem) = relative_path_problem(path) {
                issues.push(format!("{field}: '{}' {problem}", path.display()));
            }
        }
        if let DependencyManifest::Project { extra_packages, .. } = &self.dependencies {
            for pkg in extra_packages {
                if pkg.trim().is_empty() || pkg.starts_with('-') {
                    issues.push(format!("dependencies.extra_packages: '{pkg}' is not a requirement"));
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(BuildError::InvalidSpec(
                issues.iter().map(|i| format!("  - {i}")).collect::<Vec<_>>().join("\n"),
            ))
        }
    }
}

/// Paths in a spec must stay inside the project directory.
fn relative_path_problem(path: &Path) -> Option<&'static str> {
    if path.as_os_str().is_empty() {
        return Some("is empty");
    }
    for component in path.components() {
        match component {
            Component::RootDir | Component::Prefix(_) => return Some("must be relative"),
            Component::ParentDir => return Some("must not leave the project directory"),
            Component::CurDir | Component::Normal(_) => {}
        }
    }
    None
}

// ── Unit tests ───────────────────────────────────────────────────────────────
