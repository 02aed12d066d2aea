//! Turning authentication settings into a connected API session.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::api::{PowerBiApi, RestClient};
use crate::auth::provider_for;
use crate::config::{AuthenticationConfig, Settings};
use crate::error::Result;

/// Establishes one authenticated session per run.
#[async_trait]
pub trait ServiceConnector: Send + Sync {
    async fn connect(&self, auth: &AuthenticationConfig) -> Result<Arc<dyn PowerBiApi>>;
}

/// Connects to the REST API with credentials from the manifest.
/// `%NAME%` references in credential fields are expanded from the process
/// environment first.
#[derive(Debug, Clone)]
pub struct RestConnector {
    api_url: String,
    authority_url: String,
}

impl RestConnector {
    pub fn new(api_url: impl Into<String>, authority_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            authority_url: authority_url.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.api_url, &settings.authority_url)
    }
}

#[async_trait]
impl ServiceConnector for RestConnector {
    async fn connect(&self, auth: &AuthenticationConfig) -> Result<Arc<dyn PowerBiApi>> {
        let expanded = auth.expanded(|name| std::env::var(name).ok())?;
        let provider = provider_for(&expanded, &self.authority_url)?;
        let token = provider.acquire().await?;
        info!(
            endpoint = %token.endpoint,
            expires_on = ?token.expires_on,
            "authenticated"
        );
        let client = RestClient::new(&self.api_url, token.token)?;
        Ok(Arc::new(client))
    }
}
