//! Unit tests for image building and directory assembly.

#![allow(clippy::expect_used)]

use berth_cli::application::services::build_service::{
    self, ASSEMBLED_SITE_PACKAGES, ASSEMBLED_SOURCE_DIR, FINGERPRINT_FILE,
};
use berth_cli::application::services::spec_service::{self, LoadedSpec, SpecRequest};
use berth_cli::domain::{BuildError, BuildProfile};
use berth_cli::infra::config::YamlBuildSpecStore;
use berth_cli::infra::fs::LocalFs;

use crate::mocks::{RecordingRunner, SilentReporter, pyproject_project, requirements_project, write};

fn load(root: &std::path::Path) -> LoadedSpec {
    let request = SpecRequest {
        root: root.to_path_buf(),
        ..SpecRequest::default()
    };
    spec_service::load_spec(&YamlBuildSpecStore, &LocalFs, &request).expect("load spec")
}

fn leftovers(parent: &std::path::Path) -> Vec<String> {
    std::fs::read_dir(parent)
        .expect("read dir")
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.contains(".staging-"))
        .collect()
}

// ── build_image ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn build_pipes_dockerfile_to_docker() {
    let project = requirements_project();
    let loaded = load(project.path());
    let runner = RecordingRunner::succeeding();

    let outcome = build_service::build_image(&runner, &LocalFs, &SilentReporter, &loaded)
        .await
        .expect("build");

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.program, "docker");
    assert_eq!(&call.args[..5], ["build", "-f", "-", "-t", "yield-agent:latest"]);
    let dockerfile = String::from_utf8(call.stdin.clone().expect("stdin")).expect("utf8");
    assert!(dockerfile.contains("FROM python:3.11-slim"));
    assert!(dockerfile.contains(&outcome.fingerprint));
    assert_eq!(dockerfile.matches(r#"RUN ["pip","install""#).count(), 1);
}

#[tokio::test]
async fn build_failure_reports_stderr() {
    let project = requirements_project();
    let loaded = load(project.path());
    let runner = RecordingRunner::failing(b"step 1\nERROR: no matching distribution\n");

    let err = build_service::build_image(&runner, &LocalFs, &SilentReporter, &loaded)
        .await
        .expect_err("docker failed");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InstallFailed { program, code, stderr }) => {
            assert_eq!(program, "docker build");
            assert_eq!(*code, Some(1));
            assert!(stderr.contains("no matching distribution"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ── assemble_dir ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn assemble_lays_out_image_and_runs_installer_once() {
    let project = requirements_project();
    let loaded = load(project.path());
    let dest = tempfile::tempdir().expect("tempdir");
    let out = dest.path().join("image");
    let runner = RecordingRunner::succeeding();

    let outcome = build_service::assemble_dir(
        &runner,
        &LocalFs,
        &SilentReporter,
        &loaded,
        &out,
        "python3",
    )
    .await
    .expect("assemble");

    assert_eq!(outcome.output, out);
    assert!(out.join(ASSEMBLED_SOURCE_DIR).join("yield_agent/server.py").is_file());
    assert!(out.join("langgraph.json").is_file());
    assert!(!out.join("requirements.txt").exists());
    let recorded = std::fs::read_to_string(out.join(FINGERPRINT_FILE)).expect("fingerprint");
    assert_eq!(recorded, outcome.fingerprint);

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "python3");
    let args = &calls[0].args;
    assert_eq!(&args[..4], ["-m", "pip", "install", "--no-cache-dir"]);
    let target = args.iter().position(|a| a == "--target").expect("--target");
    assert!(args[target + 1].ends_with(ASSEMBLED_SITE_PACKAGES));
    assert!(args.iter().any(|a| a == "-r"));
    assert!(leftovers(dest.path()).is_empty());
}

#[tokio::test]
async fn installer_failure_leaves_nothing_behind() {
    let project = pyproject_project();
    let loaded = load(project.path());
    let dest = tempfile::tempdir().expect("tempdir");
    let out = dest.path().join("image");
    let runner = RecordingRunner::failing(b"ERROR: Could not build wheels\n");

    let err = build_service::assemble_dir(
        &runner,
        &LocalFs,
        &SilentReporter,
        &loaded,
        &out,
        "python3",
    )
    .await
    .expect_err("installer failed");

    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InstallFailed { .. })
    ));
    assert!(!out.exists());
    assert!(leftovers(dest.path()).is_empty());
}

#[tokio::test]
async fn existing_output_is_refused() {
    let project = requirements_project();
    let loaded = load(project.path());
    let dest = tempfile::tempdir().expect("tempdir");
    let out = dest.path().join("image");
    std::fs::create_dir(&out).expect("mkdir");
    let runner = RecordingRunner::succeeding();

    let err = build_service::assemble_dir(
        &runner,
        &LocalFs,
        &SilentReporter,
        &loaded,
        &out,
        "python3",
    )
    .await
    .expect_err("output exists");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::OutputExists(_))
    ));
    assert!(runner.calls().is_empty());
}

// ── plan / fingerprint ────────────────────────────────────────────────────────

#[test]
fn both_profiles_plan_a_single_installer_invocation() {
    for project in [requirements_project(), pyproject_project()] {
        let loaded = load(project.path());
        let plan = build_service::plan(&LocalFs, &loaded).expect("plan");
        assert_eq!(plan.dockerfile.matches(r#"RUN ["pip","install""#).count(), 1);
    }
}

#[test]
fn project_profile_installs_server_packages() {
    let project = pyproject_project();
    let loaded = load(project.path());
    let plan = build_service::plan(&LocalFs, &loaded).expect("plan");
    assert_eq!(plan.install.profile, BuildProfile::Project);
    assert_eq!(plan.install.extra_packages, ["uvicorn", "fastapi"]);
    assert!(
        plan.dockerfile
            .contains(r#"RUN ["pip","install","--no-cache-dir","-e",".","uvicorn","fastapi"]"#)
    );
}

#[test]
fn fingerprint_is_stable_and_tracks_source() {
    let project = requirements_project();
    let first = build_service::plan(&LocalFs, &load(project.path()))
        .expect("plan")
        .fingerprint;
    let again = build_service::plan(&LocalFs, &load(project.path()))
        .expect("plan")
        .fingerprint;
    assert_eq!(first, again);

    write(project.path(), "src/yield_agent/server.py", "app = None  # changed\n");
    let changed = build_service::plan(&LocalFs, &load(project.path()))
        .expect("plan")
        .fingerprint;
    assert_ne!(first, changed);
}

#[test]
fn fingerprint_ignores_bytecode_caches() {
    let project = requirements_project();
    let before = build_service::plan(&LocalFs, &load(project.path()))
        .expect("plan")
        .fingerprint;
    write(
        project.path(),
        "src/yield_agent/__pycache__/server.cpython-311.pyc",
        "junk",
    );
    let after = build_service::plan(&LocalFs, &load(project.path()))
        .expect("plan")
        .fingerprint;
    assert_eq!(before, after);
}

#[test]
fn missing_source_tree_fails_planning() {
    let project = requirements_project();
    std::fs::remove_dir_all(project.path().join("src")).expect("rm src");
    let err = build_service::plan(&LocalFs, &load(project.path())).expect_err("no source");
    assert!(err.to_string().contains("Source directory not found"));
}
