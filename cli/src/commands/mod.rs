//! Command implementations

pub mod assemble;
pub mod build;
pub mod check;
pub mod config;
pub mod launch;
pub mod render;
pub mod serve;
pub mod version;

use std::path::PathBuf;

use clap::Args;

use crate::application::services::spec_service::SpecRequest;
use crate::domain::{BuildProfile, RuntimeOverrides};

/// Arguments locating the build spec and project tree.
#[derive(Args, Debug, Clone)]
pub struct SpecArgs {
    /// Project directory holding the dependency manifest and source tree
    #[arg(long, default_value = ".")]
    pub project_dir: PathBuf,

    /// Build spec file [default: <project-dir>/berth.yaml]
    #[arg(long = "config", env = "BERTH_CONFIG", value_name = "FILE")]
    pub spec_file: Option<PathBuf>,

    /// Dependency profile to use when both manifests are present
    #[arg(long, value_name = "requirements|project")]
    pub profile: Option<BuildProfile>,

    /// Graph manifest, relative to the project directory
    #[arg(long, env = "GRAPH_MANIFEST", value_name = "FILE")]
    pub graph_manifest: Option<PathBuf>,
}

impl SpecArgs {
    /// Convert to the service-level request.
    #[must_use]
    pub fn request(&self) -> SpecRequest {
        SpecRequest {
            root: self.project_dir.clone(),
            spec_file: self.spec_file.clone(),
            profile: self.profile,
            graph_manifest: self.graph_manifest.clone(),
        }
    }
}

/// Runtime overrides; each flag wins over its environment variable.
#[derive(Args, Debug, Clone, Default)]
pub struct RuntimeArgs {
    /// Listen port, overrides PORT
    #[arg(long)]
    pub port: Option<u16>,

    /// Listen address, overrides HOST
    #[arg(long)]
    pub host: Option<String>,

    /// Application as module:object, overrides APP_MODULE
    #[arg(long, value_name = "MODULE:OBJECT")]
    pub app: Option<String>,

    /// Source root prepended to the search path, overrides APP_SOURCE_ROOT
    #[arg(long, value_name = "DIR")]
    pub source_root: Option<PathBuf>,
}

impl RuntimeArgs {
    /// Convert to domain overrides.
    #[must_use]
    pub fn overrides(&self) -> RuntimeOverrides {
        RuntimeOverrides {
            port: self.port,
            host: self.host.clone(),
            app: self.app.clone(),
            source_root: self.source_root.clone(),
        }
    }
}
