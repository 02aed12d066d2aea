//! Deploy command implementation.
//!
//! Plans every artifact of the selected environment before touching the
//! network, then compiles (folder mode) and deploys artifacts one at a time
//! through a single authenticated session.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};

use crate::api::ImportHandle;
use crate::compile::{CommandCompiler, PackageCompiler, ScratchArea};
use crate::config::Settings;
use crate::deploy::{
    ArtifactOutcome, ArtifactStatus, DEFAULT_POLL_TIMEOUT, DeployReport, DeploymentExecutor,
    POLL_INTERVAL, PollPolicy, ReportDeploymentInfo, RestConnector, ServiceConnector,
    WorkspaceCache, preview_artifact,
};
use crate::error::{DeployError, Result};
use crate::logging::{VerbosityControl, VerbosityGuard};
use crate::source::{MarkerFileValidator, ProjectValidator};

use super::context::RunContext;

/// Options for the deploy command
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Manifest file (JSON or TOML)
    pub manifest_path: PathBuf,
    /// Deployment profile label
    pub profile: String,
    /// Target environment name
    pub environment: String,
    /// Folder the source pattern is evaluated against
    pub base_dir: Option<PathBuf>,
    /// Log what would happen without contacting the service
    pub what_if: bool,
    /// Overrides the manifest `continueOnError` option
    pub continue_on_error: Option<bool>,
    /// Overrides the manifest and settings poll timeout
    pub poll_timeout: Option<Duration>,
}

impl DeployOptions {
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
            what_if: false,
            continue_on_error: None,
            poll_timeout: None,
        }
    }

    /// Set the base folder for source discovery
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Enable preview mode
    pub fn with_what_if(mut self, what_if: bool) -> Self {
        self.what_if = what_if;
        self
    }

    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = Some(continue_on_error);
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = Some(timeout);
        self
    }
}

/// Deploy command orchestrator
pub struct DeployCommand {
    connector: Arc<dyn ServiceConnector>,
    compiler: Arc<dyn PackageCompiler>,
    validator: Arc<dyn ProjectValidator>,
    verbosity: Option<Arc<dyn VerbosityControl>>,
    settings: Settings,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl DeployCommand {
    pub fn new(
        connector: Arc<dyn ServiceConnector>,
        compiler: Arc<dyn PackageCompiler>,
        validator: Arc<dyn ProjectValidator>,
        settings: Settings,
    ) -> Self {
        Self {
            connector,
            compiler,
            validator,
            verbosity: None,
            settings,
            poll_interval: POLL_INTERVAL,
            cancel: CancellationToken::new(),
        }
    }

    /// Create a deploy command wired to the REST API and the configured compiler.
    pub fn with_defaults() -> anyhow::Result<Self> {
        let settings = Settings::from_env()?;
        let compiler = CommandCompiler::from_command_line(&settings.compiler)?;
        Ok(Self::new(
            Arc::new(RestConnector::from_settings(&settings)),
            Arc::new(compiler),
            Arc::new(MarkerFileValidator::default()),
            settings,
        ))
    }

    /// Quiet logging to WARN while the compiler runs.
    pub fn with_verbosity_control(mut self, control: Arc<dyn VerbosityControl>) -> Self {
        self.verbosity = Some(control);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Execute the deploy command.
    ///
    /// Artifact failures collected under continue-on-error are reported in
    /// the returned [`DeployReport`]; call [`DeployReport::ensure_success`] to
    /// turn them into an error.
    pub async fn execute(&self, options: &DeployOptions) -> Result<DeployReport> {
        let ctx = RunContext::load(
            &options.manifest_path,
            &options.profile,
            &options.environment,
            options.base_dir.as_deref(),
            &self.settings,
        )?;
        let mut report = DeployReport::new(ctx.profile(), ctx.environment_name());
        report.what_if = options.what_if;

        if ctx.is_disabled() {
            warn!(
                profile = %ctx.profile(),
                environment = %ctx.environment_name(),
                "environment is disabled, skipping deployment"
            );
            report.skipped = true;
            return Ok(report);
        }

        let plan = ctx.plan(self.validator.as_ref())?;
        report.warnings = plan.warnings.iter().map(ToString::to_string).collect();
        if plan.artifacts.is_empty() {
            warn!(base = %ctx.base_dir().display(), "nothing to deploy");
            return Ok(report);
        }
        info!(
            profile = %ctx.profile(),
            environment = %ctx.environment_name(),
            artifacts = plan.artifacts.len(),
            "deployment planned"
        );

        if options.what_if {
            for info in &plan.artifacts {
                preview_artifact(info);
                report.outcomes.push(outcome(info, ArtifactStatus::Previewed));
            }
            return Ok(report);
        }

        let auth = ctx.manifest().authentication.as_ref().ok_or_else(|| {
            DeployError::config(format!(
                "deployment profile '{}' has no authentication settings",
                ctx.profile()
            ))
        })?;
        let api = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(DeployError::Cancelled),
            connected = self.connector.connect(auth) => connected?,
        };

        let policy = self.poll_policy(&ctx, options);
        let continue_on_error = options
            .continue_on_error
            .unwrap_or(ctx.manifest().options.continue_on_error);
        let executor = DeploymentExecutor::new(api.as_ref(), policy, self.cancel.clone());
        let mut cache = WorkspaceCache::new();

        for info in &plan.artifacts {
            match self.deploy_artifact(&executor, info, &mut cache, ctx.scratch()).await {
                Ok(handle) => report.outcomes.push(outcome(
                    info,
                    ArtifactStatus::Deployed {
                        reports: handle.reports.iter().map(|r| r.id.clone()).collect(),
                        import_id: handle.id,
                    },
                )),
                Err(err) if continue_on_error && err.is_artifact_scoped() => {
                    error!(artifact = %info.display_name, error = %err, "continuing after failure");
                    report.outcomes.push(outcome(
                        info,
                        ArtifactStatus::Failed {
                            error: err.to_string(),
                        },
                    ));
                }
                Err(err) => return Err(err),
            }
        }

        report.workspace_lookups = cache.lookups();
        info!(
            deployed = report.deployed(),
            failed = report.failed().len(),
            workspace_lookups = report.workspace_lookups,
            "deployment finished"
        );
        Ok(report)
    }

    async fn deploy_artifact(
        &self,
        executor: &DeploymentExecutor<'_>,
        info: &ReportDeploymentInfo,
        cache: &mut WorkspaceCache,
        scratch: &ScratchArea,
    ) -> Result<ImportHandle> {
        if info.needs_compile() {
            self.compile(info).await?;
        }
        let handle = executor.execute(info, cache).await?;
        if let Some(dir) = &info.scratch_dir {
            if let Err(err) = scratch.remove(dir).await {
                warn!(dir = %dir.display(), error = %err, "failed to remove scratch directory");
            }
        }
        Ok(handle)
    }

    async fn compile(&self, info: &ReportDeploymentInfo) -> Result<()> {
        let quiet = self
            .verbosity
            .as_deref()
            .map(|control| VerbosityGuard::enter(control, LevelFilter::WARN));
        let compiled = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(DeployError::Cancelled),
            compiled = self.compiler.compile(&info.source_path, &info.package_path, &info.parameters) => compiled,
        };
        drop(quiet);

        let compiled = compiled?;
        info!(
            artifact = %info.display_name,
            package = %compiled.path.display(),
            entries = compiled.entries.len(),
            "compiled project"
        );
        Ok(())
    }

    fn poll_policy(&self, ctx: &RunContext, options: &DeployOptions) -> PollPolicy {
        let timeout = options
            .poll_timeout
            .or_else(|| {
                ctx.manifest()
                    .options
                    .poll_timeout_secs
                    .map(Duration::from_secs)
            })
            .or(self.settings.poll_timeout)
            .unwrap_or(DEFAULT_POLL_TIMEOUT);
        PollPolicy::default()
            .with_interval(self.poll_interval)
            .with_timeout(timeout)
    }
}

fn outcome(info: &ReportDeploymentInfo, status: ArtifactStatus) -> ArtifactOutcome {
    ArtifactOutcome {
        display_name: info.display_name.clone(),
        source_path: info.source_path.clone(),
        workspace: info.workspace.clone(),
        status,
    }
}
