//! Wire types for the workspace and import endpoints.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal wire value for a finished import.
const STATE_SUCCEEDED: &str = "Succeeded";
/// Terminal wire value for a failed import.
const STATE_FAILED: &str = "Failed";

/// Typed view of the free-form `importState` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportState {
    Succeeded,
    Failed,
    /// Anything else, including a state the service has not populated yet.
    Pending(Option<String>),
}

impl ImportState {
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw {
            Some(STATE_SUCCEEDED) => Self::Succeeded,
            Some(STATE_FAILED) => Self::Failed,
            other => Self::Pending(other.map(str::to_string)),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending(_))
    }
}

impl fmt::Display for ImportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "{}", STATE_SUCCEEDED),
            Self::Failed => write!(f, "{}", STATE_FAILED),
            Self::Pending(Some(raw)) => write!(f, "{}", raw),
            Self::Pending(None) => write!(f, "<pending>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// An import job as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportHandle {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub import_state: Option<String>,
    #[serde(default)]
    pub reports: Vec<Report>,
    #[serde(default)]
    pub datasets: Vec<Dataset>,
    #[serde(default)]
    pub created_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_date_time: Option<DateTime<Utc>>,
}

impl ImportHandle {
    pub fn state(&self) -> ImportState {
        ImportState::from_wire(self.import_state.as_deref())
    }

    /// Name for diagnostics, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// A workspace ("group" on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_on_dedicated_capacity: bool,
    #[serde(default)]
    pub capacity_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capacity {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

/// A workspace reference resolved to its identity and capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWorkspace {
    pub group: Group,
    pub capacity: Option<Capacity>,
}

/// Behavior when an artifact with the same name already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameConflict {
    Ignore,
    Abort,
    Overwrite,
    #[default]
    CreateOrOverwrite,
    GenerateUniqueName,
}

impl NameConflict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignore => "Ignore",
            Self::Abort => "Abort",
            Self::Overwrite => "Overwrite",
            Self::CreateOrOverwrite => "CreateOrOverwrite",
            Self::GenerateUniqueName => "GenerateUniqueName",
        }
    }
}

/// Import request flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    #[serde(default)]
    pub name_conflict: NameConflict,
    #[serde(default)]
    pub skip_report: bool,
    #[serde(default)]
    pub override_report_label: bool,
    #[serde(default)]
    pub override_model_label: bool,
}
