//! Manifest schema.
//!
//! A manifest file holds one or more named deployment profiles:
//!
//! ```json
//! {
//!   "deployments": {
//!     "Sales": {
//!       "source": { "type": "Folder", "path": "Sales/{year}" },
//!       "authentication": { "type": "ServicePrincipal", "tenantId": "%TENANT%", ... },
//!       "environments": {
//!         "Prod": { "workspace": "Sales", "displayName": "{PBIXPROJ_NAME} ({ENVIRONMENT})" }
//!       }
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::api::ImportOptions;
use crate::auth::expand_env;
use crate::error::{DeployError, Result};
use crate::params::system;
use crate::source::SourceKind;

/// Root of a manifest file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentsFile {
    /// Deployment profiles keyed by label
    #[serde(default)]
    pub deployments: BTreeMap<String, DeploymentManifest>,
}

impl DeploymentsFile {
    /// Look up a profile by label.
    pub fn profile(&self, label: &str) -> Result<&DeploymentManifest> {
        self.deployments.get(label).ok_or_else(|| {
            let known: Vec<&str> = self.deployments.keys().map(String::as_str).collect();
            DeployError::config(format!(
                "deployment profile '{}' not found (available: {})",
                label,
                known.join(", ")
            ))
        })
    }

    /// Structural checks that do not depend on the selected profile.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.deployments.is_empty() {
            anyhow::bail!("Manifest declares no deployments");
        }
        for (label, manifest) in &self.deployments {
            if manifest.source.path.trim().is_empty() {
                anyhow::bail!("Deployment '{}' has an empty source path", label);
            }
            for (name, environment) in &manifest.environments {
                if environment.workspace.trim().is_empty() {
                    anyhow::bail!(
                        "Environment '{}' of deployment '{}' has no workspace",
                        name,
                        label
                    );
                }
            }
        }
        Ok(())
    }
}

/// Kind of artifact a profile deploys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentMode(String);

impl DeploymentMode {
    pub const REPORT: &'static str = "Report";

    pub fn ensure_supported(&self) -> Result<()> {
        if self.0 == Self::REPORT {
            Ok(())
        } else {
            Err(DeployError::config(format!(
                "deployment mode '{}' is not supported",
                self.0
            )))
        }
    }
}

impl Default for DeploymentMode {
    fn default() -> Self {
        Self(Self::REPORT.to_string())
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One deployment profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentManifest {
    #[serde(default)]
    pub mode: DeploymentMode,

    #[serde(default)]
    pub description: Option<String>,

    pub source: SourceConfig,

    /// Required unless running in preview mode
    #[serde(default)]
    pub authentication: Option<AuthenticationConfig>,

    #[serde(default)]
    pub options: DeploymentOptions,

    /// Manifest-wide default parameters
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,

    #[serde(default)]
    pub environments: BTreeMap<String, DeploymentEnvironment>,

    /// Scratch root for compiled packages
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl DeploymentManifest {
    pub fn environment(&self, name: &str) -> Result<&DeploymentEnvironment> {
        self.environments.get(name).ok_or_else(|| {
            DeployError::config(format!("environment '{}' is not defined", name))
        })
    }
}

/// Where sources live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// "Folder" or "File"
    #[serde(rename = "type")]
    pub kind: String,
    /// Path pattern relative to the base folder
    pub path: String,
}

impl SourceConfig {
    pub fn source_kind(&self) -> Result<SourceKind> {
        match self.kind.as_str() {
            "Folder" => Ok(SourceKind::Folder),
            "File" => Ok(SourceKind::File),
            other => Err(DeployError::config(format!(
                "source type '{}' is not supported (expected Folder or File)",
                other
            ))),
        }
    }
}

/// A named deployment target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentEnvironment {
    /// Templated display name; defaults by source kind
    #[serde(default)]
    pub display_name: Option<String>,

    /// Templated workspace name or id
    pub workspace: String,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl DeploymentEnvironment {
    /// Display name template, falling back to the source-kind default.
    pub fn display_name_template(&self, kind: SourceKind) -> String {
        self.display_name.clone().unwrap_or_else(|| match kind {
            SourceKind::Folder => format!("{{{}}}", system::PBIXPROJ_NAME),
            SourceKind::File => format!("{{{}}}", system::FILE_NAME_WITHOUT_EXT),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentOptions {
    #[serde(default)]
    pub import: ImportOptions,

    /// Keep deploying remaining artifacts after one fails
    #[serde(default)]
    pub continue_on_error: bool,

    /// Upper bound on waiting for one import
    #[serde(default)]
    pub poll_timeout_secs: Option<u64>,
}

/// Supported credential flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationType {
    ServicePrincipal,
    AccessToken,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub authority: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl fmt::Debug for AuthenticationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationConfig")
            .field("kind", &self.kind)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("authority", &self.authority)
            .field("scope", &self.scope)
            .finish()
    }
}

impl AuthenticationConfig {
    pub fn auth_type(&self) -> Result<AuthenticationType> {
        match self.kind.as_str() {
            "ServicePrincipal" => Ok(AuthenticationType::ServicePrincipal),
            "AccessToken" => Ok(AuthenticationType::AccessToken),
            other => Err(DeployError::config(format!(
                "authentication type '{}' is not supported",
                other
            ))),
        }
    }

    /// Copy with every field's `%NAME%` references expanded.
    pub fn expanded<F>(&self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let expand = |value: &Option<String>| -> Result<Option<String>> {
            value
                .as_deref()
                .map(|v| expand_env(v, &lookup))
                .transpose()
        };

        Ok(Self {
            kind: self.kind.clone(),
            tenant_id: expand(&self.tenant_id)?,
            client_id: expand(&self.client_id)?,
            client_secret: expand(&self.client_secret)?,
            token: expand(&self.token)?,
            authority: expand(&self.authority)?,
            scope: expand(&self.scope)?,
        })
    }
}
