//! Source discovery for deployable artifacts.
//!
//! Two modes are supported:
//! - folder mode: project folders compiled into a package before upload
//! - file mode: pre-built package files uploaded as-is

mod discover;
mod project;
mod types;

pub use discover::{resolve_source_files, resolve_source_folders};
pub use project::{MarkerFileValidator, PROJECT_MARKER, ProjectValidator};
pub use types::{
    DeploymentSourceInfo, Discovery, DiscoveryWarning, PACKAGE_EXTENSION, SourceKind,
};
