//! Deployment parameters: system keys, layered resolution and templating.

mod parameters;
pub mod system;
mod template;

pub use parameters::DeploymentParameters;
pub use template::{TemplateError, expand_template};
