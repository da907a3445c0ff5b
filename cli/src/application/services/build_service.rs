//! Application service — image build and directory assembly.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::ports::{CommandRunner, ProgressReporter, ProjectFs};
use crate::application::services::spec_service::LoadedSpec;
use crate::domain::dockerfile::render_dockerfile;
use crate::domain::fingerprint::{FingerprintInput, fingerprint};
use crate::domain::install::{InstallTarget, normalize};
use crate::domain::{BuildError, InstallSet, Lifecycle, Phase};

/// Image-relative location of the source tree in an assembled directory.
pub const ASSEMBLED_SOURCE_DIR: &str = "app/src";
pub const ASSEMBLED_SITE_PACKAGES: &str = "site-packages";
pub const FINGERPRINT_FILE: &str = ".berth-fingerprint";

/// Lines of installer stderr kept in error messages.
const STDERR_TAIL_LINES: usize = 20;

/// Everything derived from a spec before anything is executed.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub install: InstallSet,
    pub fingerprint: String,
    pub dockerfile: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildOutcome {
    pub tag: String,
    pub fingerprint: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssembleOutcome {
    pub output: PathBuf,
    pub fingerprint: String,
}

/// Collect the manifest, source tree, and graph manifest for hashing.
///
/// # Errors
///
/// Returns an error if any input cannot be read.
pub fn collect_inputs(fs: &impl ProjectFs, loaded: &LoadedSpec) -> Result<Vec<FingerprintInput>> {
    let mut inputs = Vec::new();
    for file in [loaded.manifest_path(), loaded.graph_manifest_path()] {
        let content = fs.read_to_string(&file)?;
        inputs.push(FingerprintInput::new(
            relative_label(&loaded.root, &file),
            content,
        ));
    }
    inputs.extend(fs.tree_inputs(&loaded.root, &loaded.source_path())?);
    Ok(inputs)
}

/// Normalize, fingerprint, and render without executing anything.
///
/// # Errors
///
/// Returns an error if the source tree is missing or an input cannot be read.
pub fn plan(fs: &impl ProjectFs, loaded: &LoadedSpec) -> Result<BuildPlan> {
    let source = loaded.source_path();
    anyhow::ensure!(
        fs.is_dir(&source),
        "Source directory not found: {}",
        source.display()
    );
    let install = normalize(&loaded.spec.dependencies);
    let fingerprint = fingerprint(&collect_inputs(fs, loaded)?);
    let dockerfile = render_dockerfile(&loaded.spec, &install, &fingerprint);
    Ok(BuildPlan {
        install,
        fingerprint,
        dockerfile,
    })
}

/// Build and tag a container image with `docker build`.
///
/// # Errors
///
/// Returns `BuildError::InstallFailed` if the build exits non-zero; no image
/// is tagged in that case.
pub async fn build_image(
    runner: &impl CommandRunner,
    fs: &impl ProjectFs,
    reporter: &impl ProgressReporter,
    loaded: &LoadedSpec,
) -> Result<BuildOutcome> {
    let mut lifecycle = Lifecycle::building();
    let result = build_image_inner(runner, fs, reporter, loaded).await;
    match &result {
        Ok(_) => lifecycle.advance(Phase::Built)?,
        Err(_) => lifecycle.terminate(),
    }
    result
}

async fn build_image_inner(
    runner: &impl CommandRunner,
    fs: &impl ProjectFs,
    reporter: &impl ProgressReporter,
    loaded: &LoadedSpec,
) -> Result<BuildOutcome> {
    let plan = plan(fs, loaded)?;
    let tag = loaded.spec.tag.clone();
    let context = loaded.root.display().to_string();

    reporter.step(&format!("building image {tag}..."));
    tracing::info!(%tag, fingerprint = %plan.fingerprint, "docker build");
    let output = runner
        .run_to_completion(
            "docker",
            &["build", "-f", "-", "-t", &tag, &context],
            Some(plan.dockerfile.as_bytes()),
        )
        .await
        .context("failed to run docker build")?;
    ensure_success("docker build", &output)?;

    reporter.success(&format!("image {tag} built"));
    Ok(BuildOutcome {
        tag,
        fingerprint: plan.fingerprint,
    })
}

/// Assemble the image layout into a local directory.
///
/// Work happens in a staging directory next to `out`, which is renamed into
/// place only after every step succeeded. On failure nothing is left behind.
///
/// # Errors
///
/// Returns `BuildError::OutputExists` if `out` exists, and
/// `BuildError::InstallFailed` if the installer exits non-zero.
pub async fn assemble_dir(
    runner: &impl CommandRunner,
    fs: &impl ProjectFs,
    reporter: &impl ProgressReporter,
    loaded: &LoadedSpec,
    out: &Path,
    python: &str,
) -> Result<AssembleOutcome> {
    let mut lifecycle = Lifecycle::building();
    let result = assemble_inner(runner, fs, reporter, loaded, out, python).await;
    match &result {
        Ok(_) => lifecycle.advance(Phase::Built)?,
        Err(_) => lifecycle.terminate(),
    }
    result
}

async fn assemble_inner(
    runner: &impl CommandRunner,
    fs: &impl ProjectFs,
    reporter: &impl ProgressReporter,
    loaded: &LoadedSpec,
    out: &Path,
    python: &str,
) -> Result<AssembleOutcome> {
    if fs.exists(out) {
        return Err(BuildError::OutputExists(out.to_path_buf()).into());
    }
    let plan = plan(fs, loaded)?;
    let (staging, _guard) = fs.create_staging(out)?;
    tracing::debug!(staging = %staging.display(), "created staging directory");

    reporter.step("copying source tree...");
    fs.copy_tree(&loaded.source_path(), &staging.join(ASSEMBLED_SOURCE_DIR))?;
    fs.copy_file(
        &loaded.graph_manifest_path(),
        &staging.join(loaded.spec.graph_manifest_name()),
    )?;

    reporter.step("installing packages...");
    let mut args = vec!["-m".to_string(), "pip".to_string()];
    args.extend(plan.install.installer_args(&InstallTarget::Directory {
        project_dir: loaded.root.clone(),
        site_packages: staging.join(ASSEMBLED_SITE_PACKAGES),
    }));
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = runner
        .run_to_completion(python, &arg_refs, None)
        .await
        .with_context(|| format!("failed to run {python} -m pip"))?;
    ensure_success("pip install", &output)?;

    fs.write(&staging.join(FINGERPRINT_FILE), &plan.fingerprint)?;
    fs.promote(&staging, out)?;

    reporter.success(&format!("assembled {}", out.display()));
    Ok(AssembleOutcome {
        output: out.to_path_buf(),
        fingerprint: plan.fingerprint,
    })
}

fn ensure_success(program: &str, output: &std::process::Output) -> Result<(), BuildError> {
    if output.status.success() {
        return Ok(());
    }
    Err(BuildError::InstallFailed {
        program: program.to_string(),
        code: output.status.code(),
        stderr: stderr_tail(&output.stderr),
    })
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

fn relative_label(root: &Path, file: &Path) -> String {
    file.strip_prefix(root)
        .unwrap_or(file)
        .to_string_lossy()
        .replace('\\', "/")
}
