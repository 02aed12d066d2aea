//! Deployment planning and execution.

pub mod connector;
pub mod executor;
pub mod info;
pub mod plan;
pub mod report;
pub mod workspace_cache;

pub use connector::{RestConnector, ServiceConnector};
pub use executor::{
    DEFAULT_POLL_TIMEOUT, DeploymentExecutor, DeploymentState, POLL_INTERVAL, PollPolicy,
    preview_artifact,
};
pub use info::ReportDeploymentInfo;
pub use plan::{DeploymentPlan, PlanRequest, plan_deployments};
pub use report::{ArtifactOutcome, ArtifactStatus, DeployReport};
pub use workspace_cache::WorkspaceCache;
