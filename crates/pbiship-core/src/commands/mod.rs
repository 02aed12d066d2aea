//! High-level commands for pbiship operations.
//!
//! These are the entry points frontends call; each loads the manifest,
//! selects a profile and environment, and drives the lower layers.

pub mod context;
pub mod deploy;
pub mod discover;

pub use context::RunContext;
pub use deploy::{DeployCommand, DeployOptions};
pub use discover::{DiscoverCommand, DiscoverOptions, DiscoverReport};
