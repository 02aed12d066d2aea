//! Process-level settings read from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::api::DEFAULT_API_URL;
use crate::auth::DEFAULT_AUTHORITY_URL;
use crate::compile::DEFAULT_COMPILER;

pub const TEMP_DIR: &str = "PBISHIP_TEMP_DIR";
pub const API_URL: &str = "PBISHIP_API_URL";
pub const AUTHORITY_URL: &str = "PBISHIP_AUTHORITY_URL";
pub const POLL_TIMEOUT_SECS: &str = "PBISHIP_POLL_TIMEOUT_SECS";
pub const COMPILER: &str = "PBISHIP_COMPILER";
pub const LOG_FILTER: &str = "RUST_LOG";

/// A recognized environment variable and what it controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingDescriptor {
    pub name: &'static str,
    pub description: &'static str,
}

/// Every environment variable the tool reads.
pub const SETTINGS: &[SettingDescriptor] = &[
    SettingDescriptor {
        name: TEMP_DIR,
        description: "Scratch root for compiled packages (overridden by the manifest tempDir)",
    },
    SettingDescriptor {
        name: API_URL,
        description: "REST API root for workspace and import calls",
    },
    SettingDescriptor {
        name: AUTHORITY_URL,
        description: "OAuth2 authority used for service principal sign-in",
    },
    SettingDescriptor {
        name: POLL_TIMEOUT_SECS,
        description: "Maximum seconds to wait for one import to finish",
    },
    SettingDescriptor {
        name: COMPILER,
        description: "Command line used to compile project folders",
    },
    SettingDescriptor {
        name: LOG_FILTER,
        description: "tracing filter directives, e.g. pbiship=debug",
    },
];

/// Settings resolved from the environment, with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub temp_dir: Option<PathBuf>,
    pub api_url: String,
    pub authority_url: String,
    pub poll_timeout: Option<Duration>,
    pub compiler: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            temp_dir: None,
            api_url: DEFAULT_API_URL.to_string(),
            authority_url: DEFAULT_AUTHORITY_URL.to_string(),
            poll_timeout: None,
            compiler: DEFAULT_COMPILER.to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let poll_timeout = match get(POLL_TIMEOUT_SECS) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    anyhow::anyhow!("{} must be a whole number of seconds, got '{}'", POLL_TIMEOUT_SECS, raw)
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            temp_dir: get(TEMP_DIR).map(PathBuf::from),
            api_url: get(API_URL).unwrap_or(defaults.api_url),
            authority_url: get(AUTHORITY_URL).unwrap_or(defaults.authority_url),
            poll_timeout,
            compiler: get(COMPILER).unwrap_or(defaults.compiler),
        })
    }

    /// Current raw value of a setting, for diagnostics.
    pub fn raw_value(name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}
