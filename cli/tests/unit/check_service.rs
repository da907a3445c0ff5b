//! Unit tests for project validation.

#![allow(clippy::expect_used)]

use berth_cli::application::services::check_service::{self, CheckReport, CheckStatus};
use berth_cli::application::services::spec_service::SpecRequest;
use berth_cli::infra::config::YamlBuildSpecStore;
use berth_cli::infra::fs::LocalFs;

use crate::mocks::{bare_project, pyproject_project, requirements_project, write};

fn check(root: &std::path::Path) -> CheckReport {
    let request = SpecRequest {
        root: root.to_path_buf(),
        ..SpecRequest::default()
    };
    check_service::check_project(&YamlBuildSpecStore, &LocalFs, &request)
}

fn statuses(report: &CheckReport, name: &str) -> Vec<CheckStatus> {
    report
        .checks
        .iter()
        .filter(|c| c.name == name)
        .map(|c| c.status)
        .collect()
}

#[test]
fn healthy_project_passes() {
    let project = requirements_project();
    let report = check(project.path());
    assert!(!report.has_errors(), "{report:?}");
    assert_eq!(report.count(CheckStatus::Warn), 0, "{report:?}");
    assert_eq!(statuses(&report, "application"), [CheckStatus::Ok]);
}

#[test]
fn missing_manifest_stops_early() {
    let project = bare_project();
    let report = check(project.path());
    assert!(report.has_errors());
    assert_eq!(report.checks.len(), 1);
    assert_eq!(report.checks[0].name, "build spec");
}

#[test]
fn bad_requirement_line_is_an_error() {
    let project = requirements_project();
    write(project.path(), "requirements.txt", "fastapi\n!!not-a-package\n");
    let report = check(project.path());
    assert_eq!(statuses(&report, "dependencies"), [CheckStatus::Error]);
}

#[test]
fn graph_reference_to_missing_file_is_an_error() {
    let project = requirements_project();
    std::fs::remove_file(project.path().join("src/yield_agent/graph.py")).expect("rm");
    let report = check(project.path());
    assert_eq!(statuses(&report, "graph manifest"), [CheckStatus::Error]);
}

#[test]
fn malformed_graph_manifest_is_an_error() {
    let project = requirements_project();
    write(project.path(), "langgraph.json", "{ not json");
    let report = check(project.path());
    assert!(report.has_errors());
    assert_eq!(statuses(&report, "graph manifest"), [CheckStatus::Error]);
}

#[test]
fn app_module_outside_source_tree_is_a_warning() {
    let project = requirements_project();
    write(
        project.path(),
        "berth.yaml",
        "dependencies:\n  kind: requirements\napp: installed_pkg.main:app\n",
    );
    let report = check(project.path());
    assert!(!report.has_errors(), "{report:?}");
    assert_eq!(statuses(&report, "application"), [CheckStatus::Warn]);
}

#[test]
fn duplicated_extra_package_is_a_warning() {
    let project = pyproject_project();
    write(
        project.path(),
        "pyproject.toml",
        "[project]\nname = \"yield-agent\"\ndependencies = [\"FastAPI>=0.110\"]\n",
    );
    let report = check(project.path());
    assert!(!report.has_errors(), "{report:?}");
    assert!(statuses(&report, "dependencies").contains(&CheckStatus::Warn));
}
