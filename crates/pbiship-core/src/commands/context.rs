//! Run context shared by the deploy and discover commands.
//!
//! Loads the manifest once, selects the profile and environment, and fixes
//! the base folder and scratch root every later step works against.

use std::path::{Path, PathBuf};

use crate::compile::ScratchArea;
use crate::config::{DeploymentEnvironment, DeploymentManifest, Settings, load_manifest};
use crate::deploy::{DeploymentPlan, PlanRequest, plan_deployments};
use crate::error::{DeployError, Result};
use crate::source::ProjectValidator;

/// A selected profile and environment, ready to plan.
#[derive(Debug, Clone)]
pub struct RunContext {
    profile: String,
    environment_name: String,
    manifest: DeploymentManifest,
    environment: DeploymentEnvironment,
    base_dir: PathBuf,
    scratch: ScratchArea,
}

impl RunContext {
    /// Load `manifest_path` and select `profile` / `environment`.
    ///
    /// The base folder defaults to the manifest's directory. The scratch root
    /// is the manifest `tempDir` (relative to the base folder), then the
    /// configured setting, then the user cache directory.
    pub fn load(
        manifest_path: &Path,
        profile: &str,
        environment: &str,
        base_dir: Option<&Path>,
        settings: &Settings,
    ) -> Result<Self> {
        let file = load_manifest(manifest_path).map_err(|e| DeployError::config(format!("{:#}", e)))?;
        let manifest = file.profile(profile)?.clone();
        manifest.mode.ensure_supported()?;
        let selected = manifest.environment(environment)?.clone();

        let base_dir = base_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| manifest_dir(manifest_path));
        let scratch_root = manifest
            .temp_dir
            .as_ref()
            .map(|dir| base_dir.join(dir))
            .or_else(|| settings.temp_dir.clone())
            .unwrap_or_else(ScratchArea::default_root);

        Ok(Self {
            profile: profile.to_string(),
            environment_name: environment.to_string(),
            manifest,
            environment: selected,
            base_dir,
            scratch: ScratchArea::new(scratch_root),
        })
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn environment_name(&self) -> &str {
        &self.environment_name
    }

    pub fn manifest(&self) -> &DeploymentManifest {
        &self.manifest
    }

    pub fn environment(&self) -> &DeploymentEnvironment {
        &self.environment
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn scratch(&self) -> &ScratchArea {
        &self.scratch
    }

    pub fn is_disabled(&self) -> bool {
        self.environment.disabled
    }

    /// Discover and resolve every artifact of the selected environment.
    pub fn plan(&self, validator: &dyn ProjectValidator) -> Result<DeploymentPlan> {
        plan_deployments(
            &self.manifest,
            &self.environment,
            PlanRequest {
                profile: &self.profile,
                environment: &self.environment_name,
                base_dir: &self.base_dir,
                scratch: &self.scratch,
            },
            validator,
        )
    }
}

fn manifest_dir(manifest_path: &Path) -> PathBuf {
    match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"{
        "deployments": {
            "reports": {
                "source": { "type": "File", "path": "*.pbix" },
                "tempDir": "scratch",
                "environments": {
                    "prod": { "workspace": "Sales" }
                }
            }
        }
    }"#;

    #[test]
    fn base_dir_defaults_to_manifest_folder() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("deploy.json");
        std::fs::write(&path, MANIFEST).unwrap();

        let ctx = RunContext::load(&path, "reports", "prod", None, &Settings::default()).unwrap();

        assert_eq!(ctx.base_dir(), temp.path());
        assert_eq!(ctx.scratch().root(), temp.path().join("scratch"));
        assert!(!ctx.is_disabled());
    }

    #[test]
    fn unknown_profile_and_environment_are_configuration_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("deploy.json");
        std::fs::write(&path, MANIFEST).unwrap();

        let settings = Settings::default();
        assert!(matches!(
            RunContext::load(&path, "datasets", "prod", None, &settings),
            Err(DeployError::Configuration(_))
        ));
        assert!(matches!(
            RunContext::load(&path, "reports", "staging", None, &settings),
            Err(DeployError::Configuration(msg)) if msg.contains("staging")
        ));
    }

    #[test]
    fn unreadable_manifest_is_configuration_error() {
        let temp = TempDir::new().unwrap();
        let err = RunContext::load(
            &temp.path().join("missing.json"),
            "reports",
            "prod",
            None,
            &Settings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DeployError::Configuration(msg) if msg.contains("missing.json")));
    }
}
