//! Domain layer — pure types, parsing, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod app_id;
pub mod build_spec;
pub mod config;
pub mod dockerfile;
pub mod error;
pub mod fingerprint;
pub mod graph_manifest;
pub mod install;
pub mod launch;
pub mod lifecycle;

pub use app_id::AppIdentifier;
pub use build_spec::{BuildProfile, BuildSpec, DependencyManifest};
pub use config::{RuntimeConfig, RuntimeOverrides, ValueSource};
pub use error::{BuildError, ConfigError, GraphManifestError, LaunchError, LifecycleError};
pub use install::{InstallSet, InstallTarget};
pub use launch::{EntryStyle, LaunchCommand};
pub use lifecycle::{Lifecycle, Phase};
