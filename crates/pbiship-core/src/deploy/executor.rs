//! Per-artifact deployment: resolve workspace, upload, poll the import.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::api::{ImportHandle, ImportState, PackageUpload, PowerBiApi};
use crate::error::{DeployError, Result};

use super::info::ReportDeploymentInfo;
use super::workspace_cache::WorkspaceCache;

/// Delay between import status requests.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Upper bound on waiting for one import.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl PollPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Lifecycle of one artifact deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentState {
    Pending,
    WorkspaceResolving,
    Uploading,
    ImportPolling,
    Succeeded,
    Failed,
}

impl DeploymentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::WorkspaceResolving => "resolving workspace",
            Self::Uploading => "uploading",
            Self::ImportPolling => "waiting for import",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Deploys artifacts one at a time against a connected API.
pub struct DeploymentExecutor<'a> {
    api: &'a dyn PowerBiApi,
    poll: PollPolicy,
    cancel: CancellationToken,
}

impl<'a> DeploymentExecutor<'a> {
    pub fn new(api: &'a dyn PowerBiApi, poll: PollPolicy, cancel: CancellationToken) -> Self {
        Self { api, poll, cancel }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.poll
    }

    /// Deploy one artifact and wait for its import to reach a terminal state.
    pub async fn execute(
        &self,
        info: &ReportDeploymentInfo,
        cache: &mut WorkspaceCache,
    ) -> Result<ImportHandle> {
        let mut state = DeploymentState::Pending;
        let result = self.run(info, cache, &mut state).await;

        match &result {
            Ok(handle) => {
                advance(&mut state, DeploymentState::Succeeded, info);
                info!(
                    artifact = %info.display_name,
                    import_id = %handle.id,
                    reports = handle.reports.len(),
                    datasets = handle.datasets.len(),
                    "deployed"
                );
            }
            Err(err) => {
                error!(
                    artifact = %info.display_name,
                    stage = %state,
                    error = %err,
                    "deployment failed"
                );
                advance(&mut state, DeploymentState::Failed, info);
            }
        }
        result
    }

    async fn run(
        &self,
        info: &ReportDeploymentInfo,
        cache: &mut WorkspaceCache,
        state: &mut DeploymentState,
    ) -> Result<ImportHandle> {
        advance(state, DeploymentState::WorkspaceResolving, info);
        let workspace = self
            .cancellable(cache.resolve(&info.workspace, self.api))
            .await?;

        advance(state, DeploymentState::Uploading, info);
        let package = PackageUpload::open(&info.package_path).await?;
        info!(
            artifact = %info.display_name,
            workspace = %workspace.group.name,
            bytes = package.length,
            "uploading package"
        );
        let mut handle = self
            .cancellable(self.api.post_import(
                &workspace.group.id,
                package,
                &info.display_name,
                &info.options,
            ))
            .await?;
        if handle.name.is_none() {
            handle.name = Some(info.display_name.clone());
        }

        advance(state, DeploymentState::ImportPolling, info);
        self.wait_for_import(&workspace.group.id, handle).await
    }

    /// Poll until the import succeeds or fails. The submission response
    /// counts as the first observed status.
    pub async fn wait_for_import(
        &self,
        workspace_id: &str,
        submitted: ImportHandle,
    ) -> Result<ImportHandle> {
        let started = Instant::now();
        let deadline = started + self.poll.timeout;
        let import_id = submitted.id.clone();
        let timed_out = || DeployError::Timeout {
            import_id: import_id.clone(),
            waited: started.elapsed(),
        };

        let mut current = submitted;
        let mut polls = 0u32;
        loop {
            match current.state() {
                ImportState::Succeeded => return Ok(current),
                ImportState::Failed => {
                    return Err(DeployError::ImportFailed {
                        name: current.display_name().to_string(),
                        id: import_id.clone(),
                    });
                }
                ImportState::Pending(_) => {
                    debug!(import_id = %import_id, state = %current.state(), polls, "import pending");
                }
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(DeployError::Cancelled),
                _ = sleep_until(deadline) => return Err(timed_out()),
                _ = sleep(self.poll.interval) => {}
            }

            let mut next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(DeployError::Cancelled),
                _ = sleep_until(deadline) => return Err(timed_out()),
                polled = self.api.get_import(workspace_id, &import_id) => polled?,
            };
            polls += 1;

            if next.name.is_none() {
                next.name = current.name.take();
            }
            current = next;
        }
    }

    async fn cancellable<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(DeployError::Cancelled),
            result = operation => result,
        }
    }
}

fn advance(state: &mut DeploymentState, next: DeploymentState, info: &ReportDeploymentInfo) {
    debug!(artifact = %info.display_name, from = %state, to = %next, "state change");
    *state = next;
}

/// Log what would be deployed without contacting the service.
pub fn preview_artifact(info: &ReportDeploymentInfo) {
    info!(
        artifact = %info.display_name,
        workspace = %info.workspace,
        kind = %info.kind,
        source = %info.source_path.display(),
        name_conflict = info.options.name_conflict.as_str(),
        parameters = %info.parameters,
        "would deploy"
    );
    if info.needs_compile() {
        info!(
            artifact = %info.display_name,
            package = %info.package_path.display(),
            "would compile project"
        );
    }
}
