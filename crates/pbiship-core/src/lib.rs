//! pbiship Core Library
//!
//! Discovers report projects and packages, resolves per-environment
//! parameters, and deploys them to Power BI workspaces through the REST
//! import API.

pub mod api;
pub mod auth;
pub mod commands;
pub mod compile;
pub mod config;
pub mod deploy;
pub mod error;
pub mod logging;
pub mod params;
pub mod pattern;
pub mod source;

/// Re-exports of commonly used types
pub mod prelude {
    // Commands
    pub use crate::commands::{DeployCommand, DeployOptions, DiscoverCommand, DiscoverOptions};

    // Configuration
    pub use crate::config::{
        AuthenticationConfig, DeploymentEnvironment, DeploymentManifest, DeploymentsFile, Settings,
    };

    // Deployment
    pub use crate::deploy::{
        ArtifactStatus, DeployReport, DeploymentExecutor, PollPolicy, ReportDeploymentInfo,
        ServiceConnector, WorkspaceCache,
    };

    // Errors
    pub use crate::error::{DeployError, Result};

    // Parameters and discovery
    pub use crate::params::DeploymentParameters;
    pub use crate::pattern::PathPattern;
    pub use crate::source::{ProjectValidator, SourceKind};

    // Service
    pub use crate::api::{ImportHandle, ImportState, PowerBiApi};
}
