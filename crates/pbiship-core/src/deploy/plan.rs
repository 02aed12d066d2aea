//! Turn a manifest profile and environment into an ordered artifact list.

use std::path::Path;

use tracing::debug;

use crate::compile::ScratchArea;
use crate::config::{DeploymentEnvironment, DeploymentManifest};
use crate::error::{DeployError, Result};
use crate::params::{DeploymentParameters, expand_template, system};
use crate::pattern::PathPattern;
use crate::source::{
    DeploymentSourceInfo, DiscoveryWarning, ProjectValidator, SourceKind, resolve_source_files,
    resolve_source_folders,
};

use super::info::ReportDeploymentInfo;

/// Inputs that are not part of the manifest itself.
#[derive(Debug, Clone, Copy)]
pub struct PlanRequest<'a> {
    pub profile: &'a str,
    pub environment: &'a str,
    pub base_dir: &'a Path,
    pub scratch: &'a ScratchArea,
}

/// Artifacts in discovery order plus discovery diagnostics.
#[derive(Debug, Clone, Default)]
pub struct DeploymentPlan {
    pub artifacts: Vec<ReportDeploymentInfo>,
    pub warnings: Vec<DiscoveryWarning>,
}

/// Discover sources and resolve parameters, display names and workspace
/// references for every artifact. No network access happens here.
pub fn plan_deployments(
    manifest: &DeploymentManifest,
    environment: &DeploymentEnvironment,
    request: PlanRequest<'_>,
    validator: &dyn ProjectValidator,
) -> Result<DeploymentPlan> {
    let kind = manifest.source.source_kind()?;
    let pattern = PathPattern::compile(&manifest.source.path).map_err(|e| {
        DeployError::config(format!(
            "invalid source path '{}': {}",
            manifest.source.path, e
        ))
    })?;
    let system_parameters = system::run_parameters(request.profile, request.environment);

    let discovery = match kind {
        SourceKind::Folder => {
            resolve_source_folders(&pattern, request.base_dir, &system_parameters, validator)?
        }
        SourceKind::File => resolve_source_files(&pattern, request.base_dir, &system_parameters)?,
    };

    let display_template = environment.display_name_template(kind);
    let artifacts = discovery
        .sources
        .iter()
        .map(|source| {
            build_artifact(
                manifest,
                environment,
                kind,
                &display_template,
                source,
                request.scratch,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DeploymentPlan {
        artifacts,
        warnings: discovery.warnings,
    })
}

fn build_artifact(
    manifest: &DeploymentManifest,
    environment: &DeploymentEnvironment,
    kind: SourceKind,
    display_template: &str,
    source: &DeploymentSourceInfo,
    scratch: &ScratchArea,
) -> Result<ReportDeploymentInfo> {
    let templating = |e| DeployError::Templating {
        artifact: source.path.clone(),
        source: e,
    };

    let parameters = DeploymentParameters::resolve(
        &source.parameters,
        &manifest.parameters,
        &environment.parameters,
    )
    .map_err(templating)?;

    let display_name = expand_template(display_template, &parameters).map_err(templating)?;
    if display_name.trim().is_empty() {
        return Err(DeployError::config(format!(
            "display name for {} resolved to an empty string",
            source.path.display()
        )));
    }
    let workspace = expand_template(&environment.workspace, &parameters).map_err(templating)?;

    let (package_path, scratch_dir) = match kind {
        SourceKind::File => (source.path.clone(), None),
        SourceKind::Folder => {
            let allocated = scratch.allocate(&parameters);
            (allocated.package_path, Some(allocated.dir))
        }
    };

    debug!(
        source = %source.path.display(),
        display_name = %display_name,
        workspace = %workspace,
        "planned artifact"
    );

    Ok(ReportDeploymentInfo {
        kind,
        options: manifest.options.import.clone(),
        parameters,
        source_path: source.path.clone(),
        package_path,
        scratch_dir,
        display_name,
        workspace,
    })
}
