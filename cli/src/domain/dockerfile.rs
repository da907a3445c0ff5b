//! Container build recipe rendering.

use std::fmt::Write as _;

use crate::domain::build_spec::{BuildProfile, BuildSpec};
use crate::domain::config::{DEFAULT_PORT, DEFAULT_SOURCE_ROOT};
use crate::domain::install::{InstallSet, InstallTarget};

/// Working directory of the build and of the running server.
pub const IMAGE_WORKDIR: &str = "/app";

/// Image label carrying the build fingerprint.
pub const FINGERPRINT_LABEL: &str = "dev.berth.fingerprint";

/// Render the Dockerfile for `spec`.
///
/// Layer order: system packages, dependency manifest, installer, source tree,
/// graph manifest. For the requirement-list form the manifest is installed
/// before the source is copied so source edits keep the package layer
/// cached; project metadata needs the source present to install.
///
/// The installer step uses exec form so version constraints such as
/// `uvicorn>=0.30` reach pip verbatim instead of a shell.
#[must_use]
pub fn render_dockerfile(spec: &BuildSpec, install: &InstallSet, fingerprint: &str) -> String {
    let mut out = String::new();
    let source = spec.source_dir.display();
    let manifest = install.manifest.display();
    let manifest_name = install.manifest_file_name();
    let graph_name = spec.graph_manifest_name();
    let pip = exec_form("pip", &install.installer_args(&InstallTarget::Image));

    let _ = writeln!(out, "# syntax=docker/dockerfile:1");
    let _ = writeln!(out, "FROM {}", spec.base_image);
    let _ = writeln!(out, "LABEL {FINGERPRINT_LABEL}=\"{fingerprint}\"");
    let _ = writeln!(out);
    if !spec.system_packages.is_empty() {
        let _ = writeln!(
            out,
            "RUN apt-get update \\\n    && apt-get install -y --no-install-recommends {} \\\n    && rm -rf /var/lib/apt/lists/*",
            spec.system_packages.join(" ")
        );
        let _ = writeln!(out);
    }
    let _ = writeln!(out, "WORKDIR {IMAGE_WORKDIR}");

    match install.profile {
        BuildProfile::Requirements => {
            let _ = writeln!(out, "COPY {manifest} {IMAGE_WORKDIR}/{manifest_name}");
            let _ = writeln!(out, "RUN {pip}");
            let _ = writeln!(out, "COPY {source} {DEFAULT_SOURCE_ROOT}");
        }
        BuildProfile::Project => {
            // Same relative location pip is pointed at with `-e`.
            let _ = writeln!(out, "COPY {manifest} {IMAGE_WORKDIR}/{manifest}");
            let _ = writeln!(out, "COPY {source} {DEFAULT_SOURCE_ROOT}");
            let _ = writeln!(out, "RUN {pip}");
        }
    }

    let _ = writeln!(out, "COPY {} /{graph_name}", spec.graph_manifest.display());
    let _ = writeln!(out);
    let _ = writeln!(out, "ENV PYTHONPATH={DEFAULT_SOURCE_ROOT}");
    let _ = writeln!(out, "EXPOSE {DEFAULT_PORT}");
    let _ = writeln!(
        out,
        "CMD [\"sh\", \"-c\", \"exec python -m uvicorn {} --host 0.0.0.0 --port ${{PORT:-{DEFAULT_PORT}}}\"]",
        spec.app
    );
    out
}

/// JSON-array form of a `RUN` instruction.
fn exec_form(program: &str, args: &[String]) -> String {
    let argv: Vec<&str> = std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect();
    serde_json::Value::from(argv).to_string()
}
