//! Unit tests for build spec loading and profile detection.

#![allow(clippy::expect_used)]

use std::path::PathBuf;

use berth_cli::application::services::spec_service::{self, SpecOrigin, SpecRequest};
use berth_cli::domain::{BuildError, BuildProfile, DependencyManifest};
use berth_cli::infra::config::YamlBuildSpecStore;
use berth_cli::infra::fs::LocalFs;

use crate::mocks::{bare_project, pyproject_project, requirements_project, write};

fn request(root: &std::path::Path) -> SpecRequest {
    SpecRequest {
        root: root.to_path_buf(),
        ..SpecRequest::default()
    }
}

fn build_error(err: &anyhow::Error) -> &BuildError {
    err.downcast_ref::<BuildError>().expect("BuildError")
}

#[test]
fn detects_requirements_profile() {
    let project = requirements_project();
    let loaded = spec_service::load_spec(&YamlBuildSpecStore, &LocalFs, &request(project.path()))
        .expect("load");
    assert_eq!(
        loaded.origin,
        SpecOrigin::Detected {
            profile: BuildProfile::Requirements
        }
    );
    assert_eq!(loaded.manifest_path(), project.path().join("requirements.txt"));
    assert_eq!(loaded.spec.app.to_string(), "yield_agent.server:app");
}

#[test]
fn detects_project_profile() {
    let project = pyproject_project();
    let loaded = spec_service::load_spec(&YamlBuildSpecStore, &LocalFs, &request(project.path()))
        .expect("load");
    assert_eq!(loaded.spec.dependencies.profile(), BuildProfile::Project);
}

#[test]
fn both_manifests_need_an_explicit_profile() {
    let project = requirements_project();
    write(project.path(), "pyproject.toml", "[project]\nname = \"x\"\n");

    let err = spec_service::load_spec(&YamlBuildSpecStore, &LocalFs, &request(project.path()))
        .expect_err("ambiguous");
    assert!(matches!(build_error(&err), BuildError::AmbiguousProfile(_)));

    let mut req = request(project.path());
    req.profile = Some(BuildProfile::Project);
    let loaded = spec_service::load_spec(&YamlBuildSpecStore, &LocalFs, &req).expect("load");
    assert_eq!(loaded.spec.dependencies.profile(), BuildProfile::Project);
}

#[test]
fn no_manifest_is_an_error() {
    let project = bare_project();
    let err = spec_service::load_spec(&YamlBuildSpecStore, &LocalFs, &request(project.path()))
        .expect_err("no manifest");
    assert!(matches!(build_error(&err), BuildError::NoManifest(_)));
}

#[test]
fn spec_file_wins_over_detection() {
    let project = requirements_project();
    write(project.path(), "pyproject.toml", "[project]\nname = \"x\"\n");
    write(
        project.path(),
        "berth.yaml",
        "dependencies:\n  kind: project\n  extra_packages: [uvicorn]\ntag: agent:dev\n",
    );

    let loaded = spec_service::load_spec(&YamlBuildSpecStore, &LocalFs, &request(project.path()))
        .expect("load");
    assert!(matches!(loaded.origin, SpecOrigin::File { .. }));
    assert_eq!(loaded.spec.tag, "agent:dev");
    assert_eq!(
        loaded.spec.dependencies,
        DependencyManifest::Project {
            path: PathBuf::from("pyproject.toml"),
            extra_packages: vec!["uvicorn".to_string()],
        }
    );
}

#[test]
fn profile_flag_must_match_spec_file() {
    let project = requirements_project();
    write(project.path(), "berth.yaml", "dependencies:\n  kind: requirements\n");
    let mut req = request(project.path());
    req.profile = Some(BuildProfile::Project);

    let err = spec_service::load_spec(&YamlBuildSpecStore, &LocalFs, &req).expect_err("conflict");
    assert!(matches!(build_error(&err), BuildError::ProfileConflict { .. }));
}

#[test]
fn explicit_spec_file_must_exist() {
    let project = requirements_project();
    let mut req = request(project.path());
    req.spec_file = Some(project.path().join("missing.yaml"));

    let err = spec_service::load_spec(&YamlBuildSpecStore, &LocalFs, &req).expect_err("missing");
    assert!(err.to_string().contains("Build spec not found"));
}

#[test]
fn declared_manifest_must_exist() {
    let project = bare_project();
    write(
        project.path(),
        "berth.yaml",
        "dependencies:\n  kind: requirements\n  path: deps/prod.txt\n",
    );
    let err = spec_service::load_spec(&YamlBuildSpecStore, &LocalFs, &request(project.path()))
        .expect_err("missing manifest");
    assert!(matches!(build_error(&err), BuildError::ManifestNotFound(_)));
}

#[test]
fn graph_manifest_override_applies() {
    let project = requirements_project();
    let mut req = request(project.path());
    req.graph_manifest = Some(PathBuf::from("graphs/prod.json"));
    let loaded = spec_service::load_spec(&YamlBuildSpecStore, &LocalFs, &req).expect("load");
    assert_eq!(
        loaded.graph_manifest_path(),
        project.path().join("graphs/prod.json")
    );
    assert_eq!(loaded.spec.graph_manifest_name(), "prod.json");
}

#[test]
fn invalid_spec_is_rejected() {
    let project = requirements_project();
    write(
        project.path(),
        "berth.yaml",
        "dependencies:\n  kind: requirements\nsource_dir: /abs/src\ntag: 'Bad Tag'\n",
    );
    let err = spec_service::load_spec(&YamlBuildSpecStore, &LocalFs, &request(project.path()))
        .expect_err("invalid");
    assert!(matches!(build_error(&err), BuildError::InvalidSpec(_)));
}
