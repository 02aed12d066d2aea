//! Error types for deployment runs.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::params::TemplateError;

/// Errors that abort a deployment run (or a single artifact when
/// continue-on-error is enabled).
#[derive(Debug, Error)]
pub enum DeployError {
    /// Manifest or settings are unusable: missing profile or environment,
    /// unsupported source/auth type, undefined environment variable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A display name, workspace reference or parameter value could not be templated.
    #[error("templating failed for {}: {source}", artifact.display())]
    Templating {
        artifact: PathBuf,
        #[source]
        source: TemplateError,
    },

    /// Credential acquisition failed.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The service answered with an error status and a structured body.
    #[error("service returned HTTP {status}: {detail}")]
    Transport {
        status: u16,
        detail: serde_json::Value,
    },

    /// Any other HTTP failure, propagated as-is.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// No workspace matched the reference.
    #[error("workspace '{0}' not found")]
    WorkspaceNotFound(String),

    /// The remote import reached the "Failed" terminal state.
    #[error("import '{name}' ({id}) failed")]
    ImportFailed { name: String, id: String },

    /// The import did not reach a terminal state before the deadline.
    #[error("import {import_id} did not complete within {waited:?}")]
    Timeout { import_id: String, waited: Duration },

    /// The run was cancelled at a suspension point.
    #[error("deployment cancelled")]
    Cancelled,

    /// The external package compiler failed.
    #[error("compiling {} failed: {message}", project.display())]
    Compile { project: PathBuf, message: String },

    /// One or more artifacts failed while continue-on-error was enabled.
    #[error("{} artifact(s) failed to deploy: {}", failed.len(), failed.join(", "))]
    PartialFailure { failed: Vec<String> },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeployError {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// The remote diagnostic payload, if the error carries one.
    pub fn remote_detail(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Transport { detail, .. } => Some(detail),
            _ => None,
        }
    }

    /// Whether this failure is scoped to one artifact (and may be skipped over
    /// when continue-on-error is set) rather than to the whole run.
    pub fn is_artifact_scoped(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::Http(_)
                | Self::WorkspaceNotFound(_)
                | Self::ImportFailed { .. }
                | Self::Timeout { .. }
                | Self::Compile { .. }
                | Self::Io(_)
        )
    }
}

/// Result type for deployment operations
pub type Result<T> = std::result::Result<T, DeployError>;
