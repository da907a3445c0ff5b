//! Package installation — manifest parsing and the single installer call.
//!
//! Both manifest forms collapse into one `InstallSet`, and every `InstallSet`
//! yields exactly one `pip install` invocation.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::domain::build_spec::{BuildProfile, DependencyManifest};
use crate::domain::error::BuildError;

/// Leading distribution name of a requirement line.
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^([A-Za-z0-9](?:[A-Za-z0-9._\-]*[A-Za-z0-9])?)\s*(.*)$").expect("valid regex")
});

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"[-_.]+").expect("valid regex")
});

/// Options that pull in other files; not followed.
const INCLUDE_DIRECTIVES: &[&str] = &["-r", "--requirement", "-c", "--constraint"];

/// Global options pip accepts inside a requirements file.
const GLOBAL_OPTIONS: &[&str] = &[
    "-i",
    "--index-url",
    "--extra-index-url",
    "--no-index",
    "-f",
    "--find-links",
    "--trusted-host",
    "--pre",
    "--prefer-binary",
    "--only-binary",
    "--no-binary",
    "-e",
    "--editable",
];

// ── Requirements ─────────────────────────────────────────────────────────────

/// One installable requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    /// Normalized distribution name; `None` for direct URLs and local paths.
    pub name: Option<String>,
    /// The requirement as written, without comments.
    pub spec: String,
}

impl Requirement {
    /// Parse a single requirement string.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the string is not a requirement.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let spec = raw.trim();
        if spec.is_empty() {
            return Err("empty requirement".to_string());
        }
        if spec.starts_with('.') || spec.starts_with('/') {
            return Ok(Self {
                name: None,
                spec: spec.to_string(),
            });
        }
        let named = NAME_RE.captures(spec).and_then(|caps| {
            let rest = caps[2].trim_start();
            let valid_rest = rest.is_empty()
                || rest.starts_with(['[', '=', '<', '>', '!', '~', ';', '@', '(']);
            valid_rest.then(|| canonical_name(&caps[1]))
        });
        if named.is_none() && spec.contains("://") {
            return Ok(Self {
                name: None,
                spec: spec.to_string(),
            });
        }
        let Some(name) = named else {
            return Err("not a valid requirement specifier".to_string());
        };
        Ok(Self {
            name: Some(name),
            spec: spec.to_string(),
        })
    }
}

/// PEP 503 normalization: lowercase, separator runs become `-`.
#[must_use]
pub fn canonical_name(name: &str) -> String {
    SEPARATOR_RE.replace_all(&name.to_lowercase(), "-").into_owned()
}

/// Parse a flat requirements file.
///
/// Blank lines and `#` comments are ignored; `\` continues a line. Include
/// directives (`-r`, `-c`) are rejected rather than followed.
///
/// # Errors
///
/// Returns `BuildError::UnsupportedDirective` for include directives and
/// unknown options, and `BuildError::InvalidRequirement` for malformed lines.
pub fn parse_requirements(content: &str) -> Result<Vec<Requirement>, BuildError> {
    let mut requirements = Vec::new();
    let mut pending = String::new();
    let mut start_line = 0;

    for (idx, raw) in content.lines().enumerate() {
        if pending.is_empty() {
            start_line = idx + 1;
        }
        let line = strip_comment(raw);
        if let Some(head) = line.strip_suffix('\\') {
            pending.push_str(head);
            pending.push(' ');
            continue;
        }
        pending.push_str(line);
        let logical = std::mem::take(&mut pending);
        if let Some(req) = parse_line(logical.trim(), start_line)? {
            requirements.push(req);
        }
    }
    if let Some(req) = parse_line(pending.trim(), start_line)? {
        requirements.push(req);
    }
    Ok(requirements)
}

fn strip_comment(line: &str) -> &str {
    let trimmed = line.trim_end();
    if trimmed.trim_start().starts_with('#') {
        return "";
    }
    match trimmed.find(" #").or_else(|| trimmed.find("\t#")) {
        Some(pos) => trimmed[..pos].trim_end(),
        None => trimmed,
    }
}

fn parse_line(line: &str, line_no: usize) -> Result<Option<Requirement>, BuildError> {
    if line.is_empty() {
        return Ok(None);
    }
    if line.starts_with('-') {
        let option = line
            .split(|c: char| c.is_whitespace() || c == '=')
            .next()
            .unwrap_or(line);
        if INCLUDE_DIRECTIVES.contains(&option) || !GLOBAL_OPTIONS.contains(&option) {
            return Err(BuildError::UnsupportedDirective {
                line_no,
                directive: option.to_string(),
            });
        }
        return Ok(None);
    }
    Requirement::parse(line)
        .map(Some)
        .map_err(|reason| BuildError::InvalidRequirement {
            line_no,
            line: line.to_string(),
            reason,
        })
}

// ── Project metadata ─────────────────────────────────────────────────────────

/// The parts of `pyproject.toml` the build cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectMetadata {
    pub name: Option<String>,
    pub dependencies: Vec<Requirement>,
}

/// Parse `[project]` from a `pyproject.toml` document.
///
/// # Errors
///
/// Returns `BuildError::InvalidProject` when the document is not TOML, has no
/// `[project]` table, or lists a malformed dependency.
pub fn parse_project(content: &str) -> Result<ProjectMetadata, BuildError> {
    let doc: toml::Table =
        toml::from_str(content).map_err(|e| BuildError::InvalidProject(e.to_string()))?;
    let project = doc
        .get("project")
        .and_then(toml::Value::as_table)
        .ok_or_else(|| BuildError::InvalidProject("missing [project] table".to_string()))?;

    let name = project
        .get("name")
        .and_then(toml::Value::as_str)
        .map(canonical_name);

    let dependencies = match project.get("dependencies") {
        None => Vec::new(),
        Some(toml::Value::Array(items)) => items
            .iter()
            .map(|item| {
                let raw = item.as_str().ok_or_else(|| {
                    BuildError::InvalidProject(format!("dependency {item} is not a string"))
                })?;
                Requirement::parse(raw)
                    .map_err(|reason| BuildError::InvalidProject(format!("'{raw}': {reason}")))
            })
            .collect::<Result<_, _>>()?,
        Some(_) => {
            return Err(BuildError::InvalidProject(
                "[project].dependencies must be an array".to_string(),
            ));
        }
    };

    Ok(ProjectMetadata { name, dependencies })
}

// ── Install set ──────────────────────────────────────────────────────────────

/// Where the installer puts packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallTarget {
    /// Inside the image build, from the working directory.
    Image,
    /// Into a local directory, from manifests under `project_dir`.
    Directory {
        project_dir: PathBuf,
        site_packages: PathBuf,
    },
}

/// The canonical installable set produced from a dependency manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallSet {
    pub profile: BuildProfile,
    /// Manifest file, relative to the project directory.
    pub manifest: PathBuf,
    /// Packages installed in addition to the manifest's own.
    pub extra_packages: Vec<String>,
}

/// Normalize either manifest form into one installable set.
#[must_use]
pub fn normalize(manifest: &DependencyManifest) -> InstallSet {
    match manifest {
        DependencyManifest::Requirements { path } => InstallSet {
            profile: BuildProfile::Requirements,
            manifest: path.clone(),
            extra_packages: Vec::new(),
        },
        DependencyManifest::Project {
            path,
            extra_packages,
        } => {
            let mut seen = Vec::new();
            let mut extras = Vec::new();
            for pkg in extra_packages {
                let key = Requirement::parse(pkg)
                    .ok()
                    .and_then(|r| r.name)
                    .unwrap_or_else(|| pkg.trim().to_string());
                if !seen.contains(&key) {
                    seen.push(key);
                    extras.push(pkg.trim().to_string());
                }
            }
            InstallSet {
                profile: BuildProfile::Project,
                manifest: path.clone(),
                extra_packages: extras,
            }
        }
    }
}

impl InstallSet {
    /// Directory holding the project metadata, relative to the project root.
    #[must_use]
    pub fn project_dir(&self) -> &Path {
        match self.manifest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Arguments following `pip` for the one installer invocation.
    #[must_use]
    pub fn installer_args(&self, target: &InstallTarget) -> Vec<String> {
        let mut args: Vec<String> = vec!["install".into(), "--no-cache-dir".into()];
        match target {
            InstallTarget::Image => match self.profile {
                BuildProfile::Requirements => {
                    args.push("-r".into());
                    args.push(self.manifest_file_name());
                }
                BuildProfile::Project => {
                    args.push("-e".into());
                    args.push(self.project_dir().display().to_string());
                }
            },
            InstallTarget::Directory {
                project_dir,
                site_packages,
            } => {
                args.push("--target".into());
                args.push(site_packages.display().to_string());
                match self.profile {
                    BuildProfile::Requirements => {
                        args.push("-r".into());
                        args.push(project_dir.join(&self.manifest).display().to_string());
                    }
                    BuildProfile::Project => {
                        args.push(project_dir.join(self.project_dir()).display().to_string());
                    }
                }
            }
        }
        args.extend(self.extra_packages.iter().cloned());
        args
    }

    pub(crate) fn manifest_file_name(&self) -> String {
        self.manifest
            .file_name()
            .map_or_else(|| self.manifest.display().to_string(), |n| n.to_string_lossy().into_owned())
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
