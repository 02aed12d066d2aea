//! API seam used by the deployment executor.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

use super::types::{ImportHandle, ImportOptions, ResolvedWorkspace};

/// An opened package, streamed to the service on upload.
#[derive(Debug)]
pub struct PackageUpload {
    pub file: tokio::fs::File,
    pub length: u64,
    pub file_name: String,
}

impl PackageUpload {
    /// Open a package read-only.
    pub async fn open(path: &Path) -> Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "package.pbix".to_string());
        Ok(Self {
            file,
            length,
            file_name,
        })
    }
}

/// Workspace lookup and import operations of the remote service.
#[async_trait]
pub trait PowerBiApi: Send + Sync {
    /// Resolve a workspace by exact name or by id.
    async fn resolve_workspace(&self, reference: &str) -> Result<ResolvedWorkspace>;

    /// Upload a package and start an import job.
    async fn post_import(
        &self,
        workspace_id: &str,
        package: PackageUpload,
        display_name: &str,
        options: &ImportOptions,
    ) -> Result<ImportHandle>;

    /// Fetch the current state of an import job.
    async fn get_import(&self, workspace_id: &str, import_id: &str) -> Result<ImportHandle>;
}
