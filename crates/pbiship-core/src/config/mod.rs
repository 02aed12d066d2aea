//! Manifest schema, parsing and process settings.

pub mod parser;
pub mod schema;
pub mod settings;

pub use parser::{load_manifest, parse_manifest_str, ManifestFormat};
pub use schema::{
    AuthenticationConfig, AuthenticationType, DeploymentEnvironment, DeploymentManifest,
    DeploymentMode, DeploymentOptions, DeploymentsFile, SourceConfig,
};
pub use settings::{SETTINGS, SettingDescriptor, Settings};
