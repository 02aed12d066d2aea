//! Credential providers.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::config::{AuthenticationConfig, AuthenticationType};
use crate::error::{DeployError, Result};

/// Default OAuth2 authority.
pub const DEFAULT_AUTHORITY_URL: &str = "https://login.microsoftonline.com";
/// Default scope requested for the REST API.
pub const DEFAULT_SCOPE: &str = "https://analysis.windows.net/powerbi/api/.default";

/// A bearer token and where it came from.
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: Option<DateTime<Utc>>,
    pub endpoint: String,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Acquires access tokens. Failures are always reported as
/// [`DeployError::Authentication`].
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn acquire(&self) -> Result<AccessToken>;
}

/// Build the provider for already-expanded settings.
pub fn provider_for(
    auth: &AuthenticationConfig,
    default_authority: &str,
) -> Result<Box<dyn CredentialProvider>> {
    match auth.auth_type()? {
        AuthenticationType::ServicePrincipal => {
            let required = |value: &Option<String>, field: &str| {
                value
                    .clone()
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| {
                        DeployError::config(format!(
                            "ServicePrincipal authentication requires '{}'",
                            field
                        ))
                    })
            };
            Ok(Box::new(ServicePrincipalProvider {
                http: reqwest::Client::new(),
                authority: auth
                    .authority
                    .clone()
                    .unwrap_or_else(|| default_authority.to_string()),
                tenant_id: required(&auth.tenant_id, "tenantId")?,
                client_id: required(&auth.client_id, "clientId")?,
                client_secret: required(&auth.client_secret, "clientSecret")?,
                scope: auth.scope.clone().unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            }))
        }
        AuthenticationType::AccessToken => {
            let token = auth.token.clone().filter(|t| !t.is_empty()).ok_or_else(|| {
                DeployError::config("AccessToken authentication requires 'token'")
            })?;
            Ok(Box::new(StaticTokenProvider::new(token)))
        }
    }
}

/// OAuth2 client-credentials flow.
pub struct ServicePrincipalProvider {
    http: reqwest::Client,
    authority: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
    scope: String,
}

impl ServicePrincipalProvider {
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority.trim_end_matches('/'),
            self.tenant_id
        )
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[async_trait]
impl CredentialProvider for ServicePrincipalProvider {
    async fn acquire(&self) -> Result<AccessToken> {
        let endpoint = self.token_endpoint();
        debug!(%endpoint, client_id = %self.client_id, "requesting access token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];
        let response = self
            .http
            .post(&endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| DeployError::Authentication(format!("token request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DeployError::Authentication(format!("token response unreadable: {}", e)))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => format!("HTTP {}", status),
            };
            return Err(DeployError::Authentication(message));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            DeployError::Authentication(format!("token response malformed: {}", e))
        })?;

        Ok(AccessToken {
            token: token.access_token,
            expires_on: token.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
            endpoint,
        })
    }
}

/// A pre-acquired bearer token.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn acquire(&self) -> Result<AccessToken> {
        Ok(AccessToken {
            token: self.token.clone(),
            expires_on: None,
            endpoint: "static".to_string(),
        })
    }
}
