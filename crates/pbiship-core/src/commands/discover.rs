//! Discover command implementation.
//!
//! Resolves what a deployment would touch without compiling, authenticating
//! or uploading anything.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::config::Settings;
use crate::deploy::ReportDeploymentInfo;
use crate::error::Result;
use crate::source::{MarkerFileValidator, ProjectValidator};

use super::context::RunContext;

/// Options for the discover command
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    pub manifest_path: PathBuf,
    pub profile: String,
    pub environment: String,
    pub base_dir: Option<PathBuf>,
}

impl DiscoverOptions {
    pub fn new(
        manifest_path: impl Into<PathBuf>,
        profile: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            profile: profile.into(),
            environment: environment.into(),
            base_dir: None,
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }
}

/// Resolved artifacts for one environment
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverReport {
    pub profile: String,
    pub environment: String,
    pub disabled: bool,
    pub base_dir: PathBuf,
    pub artifacts: Vec<ReportDeploymentInfo>,
    pub warnings: Vec<String>,
}

pub struct DiscoverCommand {
    validator: Arc<dyn ProjectValidator>,
    settings: Settings,
}

impl DiscoverCommand {
    pub fn new(validator: Arc<dyn ProjectValidator>, settings: Settings) -> Self {
        Self {
            validator,
            settings,
        }
    }

    pub fn with_defaults() -> anyhow::Result<Self> {
        Ok(Self::new(
            Arc::new(MarkerFileValidator::default()),
            Settings::from_env()?,
        ))
    }

    /// Plan the environment. Disabled environments are still resolved so the
    /// result shows what enabling them would deploy.
    pub fn execute(&self, options: &DiscoverOptions) -> Result<DiscoverReport> {
        let ctx = RunContext::load(
            &options.manifest_path,
            &options.profile,
            &options.environment,
            options.base_dir.as_deref(),
            &self.settings,
        )?;
        let plan = ctx.plan(self.validator.as_ref())?;
        info!(
            profile = %ctx.profile(),
            environment = %ctx.environment_name(),
            artifacts = plan.artifacts.len(),
            "discovery complete"
        );

        Ok(DiscoverReport {
            profile: ctx.profile().to_string(),
            environment: ctx.environment_name().to_string(),
            disabled: ctx.is_disabled(),
            base_dir: ctx.base_dir().to_path_buf(),
            artifacts: plan.artifacts,
            warnings: plan.warnings.iter().map(ToString::to_string).collect(),
        })
    }
}
