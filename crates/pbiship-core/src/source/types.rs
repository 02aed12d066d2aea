//! Discovery result types.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::params::DeploymentParameters;

/// Expected extension of a deployable package file.
pub const PACKAGE_EXTENSION: &str = "pbix";

/// How sources are laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// Project folders that are compiled before upload.
    Folder,
    /// Pre-built package files.
    File,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Folder => write!(f, "Folder"),
            Self::File => write!(f, "File"),
        }
    }
}

/// One discovered candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentSourceInfo {
    /// Absolute path of the project folder or package file.
    pub path: PathBuf,
    /// System parameters plus pattern captures.
    pub parameters: DeploymentParameters,
}

/// Non-fatal discovery anomalies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryWarning {
    /// Nothing under the base folder matched.
    NoMatches { pattern: String, base: PathBuf },
    /// A matched file does not carry the package extension. The file is still included.
    UnexpectedExtension { path: PathBuf },
}

impl fmt::Display for DiscoveryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatches { pattern, base } => write!(
                f,
                "no sources matching '{}' found under {}",
                pattern,
                base.display()
            ),
            Self::UnexpectedExtension { path } => write!(
                f,
                "{} does not have the .{} extension; deploying it anyway",
                path.display(),
                PACKAGE_EXTENSION
            ),
        }
    }
}

/// Output of a discovery pass.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub sources: Vec<DeploymentSourceInfo>,
    pub warnings: Vec<DiscoveryWarning>,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
