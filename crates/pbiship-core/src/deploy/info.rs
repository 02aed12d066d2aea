//! One artifact ready for execution.

use std::path::PathBuf;

use serde::Serialize;

use crate::api::ImportOptions;
use crate::params::DeploymentParameters;
use crate::source::SourceKind;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDeploymentInfo {
    pub kind: SourceKind,
    pub options: ImportOptions,
    pub parameters: DeploymentParameters,
    /// Project folder (folder mode) or package file (file mode)
    pub source_path: PathBuf,
    /// Package to upload; a scratch path in folder mode
    pub package_path: PathBuf,
    /// Per-artifact scratch directory owning `package_path` (folder mode)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
    /// Templated, never empty
    pub display_name: String,
    /// Templated workspace name or id
    pub workspace: String,
}

impl ReportDeploymentInfo {
    pub fn needs_compile(&self) -> bool {
        self.kind == SourceKind::Folder
    }
}
