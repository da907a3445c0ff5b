//! Application service — validate a project without building it.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::Path;

use serde::Serialize;

use crate::application::ports::{BuildSpecStore, ProjectFs};
use crate::application::services::spec_service::{LoadedSpec, SpecOrigin, SpecRequest, load_spec};
use crate::domain::DependencyManifest;
use crate::domain::graph_manifest::GraphManifest;
use crate::domain::install::{Requirement, parse_project, parse_requirements};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckItem {
    pub name: &'static str,
    pub status: CheckStatus,
    pub detail: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub checks: Vec<CheckItem>,
}

impl CheckReport {
    fn push(&mut self, name: &'static str, status: CheckStatus, detail: impl Into<String>) {
        self.checks.push(CheckItem {
            name,
            status,
            detail: detail.into(),
        });
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.checks.iter().any(|c| c.status == CheckStatus::Error)
    }

    #[must_use]
    pub fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }
}

/// Run every check; failures are collected, never returned early as errors.
pub fn check_project(
    store: &impl BuildSpecStore,
    fs: &impl ProjectFs,
    request: &SpecRequest,
) -> CheckReport {
    let mut report = CheckReport::default();

    let loaded = match load_spec(store, fs, request) {
        Ok(loaded) => loaded,
        Err(e) => {
            report.push("build spec", CheckStatus::Error, format!("{e:#}"));
            return report;
        }
    };
    let origin = match &loaded.origin {
        SpecOrigin::File { path } => format!("loaded from {}", path.display()),
        SpecOrigin::Detected { profile } => format!("detected ({profile} profile)"),
    };
    report.push("build spec", CheckStatus::Ok, origin);

    check_dependencies(fs, &loaded, &mut report);
    let source_ok = check_source(fs, &loaded, &mut report);
    if source_ok {
        check_application(fs, &loaded, &mut report);
    }
    check_graph_manifest(fs, &loaded, &mut report);
    report
}

fn check_dependencies(fs: &impl ProjectFs, loaded: &LoadedSpec, report: &mut CheckReport) {
    let path = loaded.manifest_path();
    let content = match fs.read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            report.push("dependencies", CheckStatus::Error, format!("{e:#}"));
            return;
        }
    };
    match &loaded.spec.dependencies {
        DependencyManifest::Requirements { .. } => match parse_requirements(&content) {
            Ok(reqs) => report.push(
                "dependencies",
                CheckStatus::Ok,
                format!("{} requirement(s) in {}", reqs.len(), path.display()),
            ),
            Err(e) => report.push("dependencies", CheckStatus::Error, e.to_string()),
        },
        DependencyManifest::Project { extra_packages, .. } => match parse_project(&content) {
            Ok(meta) => {
                report.push(
                    "dependencies",
                    CheckStatus::Ok,
                    format!(
                        "{} dependency(ies) + {} extra package(s) in {}",
                        meta.dependencies.len(),
                        extra_packages.len(),
                        path.display()
                    ),
                );
                let declared: Vec<&str> = meta
                    .dependencies
                    .iter()
                    .filter_map(|r| r.name.as_deref())
                    .collect();
                for extra in extra_packages {
                    let name = Requirement::parse(extra).ok().and_then(|r| r.name);
                    if name.as_deref().is_some_and(|n| declared.contains(&n)) {
                        report.push(
                            "dependencies",
                            CheckStatus::Warn,
                            format!("'{extra}' is both a project dependency and an extra package"),
                        );
                    }
                }
            }
            Err(e) => report.push("dependencies", CheckStatus::Error, e.to_string()),
        },
    }
}

fn check_source(fs: &impl ProjectFs, loaded: &LoadedSpec, report: &mut CheckReport) -> bool {
    let source = loaded.source_path();
    if fs.is_dir(&source) {
        report.push("source tree", CheckStatus::Ok, source.display().to_string());
        true
    } else {
        report.push(
            "source tree",
            CheckStatus::Error,
            format!("{} is not a directory", source.display()),
        );
        false
    }
}

fn check_application(fs: &impl ProjectFs, loaded: &LoadedSpec, report: &mut CheckReport) {
    let app = &loaded.spec.app;
    let source = loaded.source_path();
    let found = app
        .module_files()
        .iter()
        .map(|rel| source.join(rel))
        .find(|candidate| fs.exists(candidate));
    match found {
        Some(file) => report.push(
            "application",
            CheckStatus::Ok,
            format!("{app} → {}", file.display()),
        ),
        None => report.push(
            "application",
            CheckStatus::Warn,
            format!(
                "module {} not found under {}; it must come from an installed package",
                app.module(),
                source.display()
            ),
        ),
    }
}

fn check_graph_manifest(fs: &impl ProjectFs, loaded: &LoadedSpec, report: &mut CheckReport) {
    let path = loaded.graph_manifest_path();
    if !fs.exists(&path) {
        report.push(
            "graph manifest",
            CheckStatus::Error,
            format!("{} not found", path.display()),
        );
        return;
    }
    let manifest = match fs
        .read_to_string(&path)
        .map_err(|e| format!("{e:#}"))
        .and_then(|c| GraphManifest::parse(&c).map_err(|e| e.to_string()))
    {
        Ok(manifest) => manifest,
        Err(e) => {
            report.push("graph manifest", CheckStatus::Error, e);
            return;
        }
    };
    let references = match manifest.references() {
        Ok(refs) => refs,
        Err(e) => {
            report.push("graph manifest", CheckStatus::Error, e.to_string());
            return;
        }
    };

    let mut missing = 0;
    for reference in &references {
        let file = loaded.root.join(&reference.file);
        if !fs.exists(&file) {
            missing += 1;
            report.push(
                "graph manifest",
                CheckStatus::Error,
                format!(
                    "graph '{}' points at missing file {}",
                    reference.graph,
                    file.display()
                ),
            );
        }
    }
    for dep in &manifest.dependencies {
        if is_local_path(dep) && !fs.exists(&loaded.root.join(dep)) {
            report.push(
                "graph manifest",
                CheckStatus::Warn,
                format!("dependency path '{dep}' does not exist"),
            );
        }
    }
    if missing == 0 {
        report.push(
            "graph manifest",
            CheckStatus::Ok,
            format!("{} graph(s) in {}", references.len(), path.display()),
        );
    }
}

fn is_local_path(dep: &str) -> bool {
    dep == "." || dep.starts_with("./") || dep.starts_with("../") || Path::new(dep).is_absolute()
}
