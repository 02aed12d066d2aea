//! Remote workspace and import API.

mod client;
mod rest;
mod types;

pub use client::{PackageUpload, PowerBiApi};
pub use rest::{DEFAULT_API_URL, RestClient};
pub use types::{
    Capacity, Dataset, Group, ImportHandle, ImportOptions, ImportState, NameConflict, Report,
    ResolvedWorkspace,
};
