//! Credential acquisition.
//!
//! Authentication settings support `%NAME%` environment-variable expansion
//! before a provider is built from them.

mod expand;
mod provider;

pub use expand::expand_env;
pub use provider::{
    AccessToken, CredentialProvider, DEFAULT_AUTHORITY_URL, DEFAULT_SCOPE,
    ServicePrincipalProvider, StaticTokenProvider, provider_for,
};
