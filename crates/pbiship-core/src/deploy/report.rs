//! Run summaries.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{DeployError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ArtifactStatus {
    Deployed {
        import_id: String,
        reports: Vec<String>,
    },
    /// Preview only; nothing was sent.
    Previewed,
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactOutcome {
    pub display_name: String,
    pub source_path: PathBuf,
    pub workspace: String,
    #[serde(flatten)]
    pub status: ArtifactStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployReport {
    pub profile: String,
    pub environment: String,
    /// The environment is disabled; nothing ran.
    pub skipped: bool,
    pub what_if: bool,
    pub outcomes: Vec<ArtifactOutcome>,
    pub warnings: Vec<String>,
    /// Remote workspace lookups performed by this run
    pub workspace_lookups: usize,
}

impl DeployReport {
    pub fn new(profile: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            environment: environment.into(),
            ..Default::default()
        }
    }

    pub fn deployed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ArtifactStatus::Deployed { .. }))
            .count()
    }

    pub fn failed(&self) -> Vec<&ArtifactOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ArtifactStatus::Failed { .. }))
            .collect()
    }

    /// Turn collected artifact failures into [`DeployError::PartialFailure`].
    pub fn ensure_success(&self) -> Result<()> {
        let failed: Vec<String> = self
            .failed()
            .into_iter()
            .map(|o| o.display_name.clone())
            .collect();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(DeployError::PartialFailure { failed })
        }
    }
}
