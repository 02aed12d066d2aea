//! reqwest-backed implementation of [`PowerBiApi`].

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{DeployError, Result};

use super::client::{PackageUpload, PowerBiApi};
use super::types::{Capacity, Group, ImportHandle, ImportOptions, ResolvedWorkspace};

/// Default REST API root.
pub const DEFAULT_API_URL: &str = "https://api.powerbi.com/v1.0/myorg/";

#[derive(Debug, Deserialize)]
struct ODataList<T> {
    value: Vec<T>,
}

/// Authenticated REST session, reused for every artifact in a run.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl RestClient {
    /// Create a client against `base_url` with a bearer token.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| DeployError::config(format!("invalid API url '{}': {}", base_url, e)))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("pbiship/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: token.into(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DeployError::config(format!("invalid endpoint '{}': {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "GET");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn find_group(&self, reference: &str) -> Result<Option<Group>> {
        let filter = if Uuid::parse_str(reference).is_ok() {
            format!("id eq '{}'", reference)
        } else {
            format!("name eq '{}'", reference.replace('\'', "''"))
        };
        let mut url = self.endpoint("groups")?;
        url.query_pairs_mut().append_pair("$filter", &filter);

        let groups: ODataList<Group> = self.get_json(url).await?;
        Ok(groups.value.into_iter().next())
    }

    async fn find_capacity(&self, capacity_id: &str) -> Result<Option<Capacity>> {
        let url = self.endpoint("capacities")?;
        let capacities: ODataList<Capacity> = self.get_json(url).await?;
        Ok(capacities
            .value
            .into_iter()
            .find(|c| c.id.eq_ignore_ascii_case(capacity_id)))
    }
}

#[async_trait]
impl PowerBiApi for RestClient {
    async fn resolve_workspace(&self, reference: &str) -> Result<ResolvedWorkspace> {
        let group = self
            .find_group(reference)
            .await?
            .ok_or_else(|| DeployError::WorkspaceNotFound(reference.to_string()))?;

        let capacity = match group.capacity_id.as_deref() {
            Some(capacity_id) => {
                let capacity = self.find_capacity(capacity_id).await?;
                if capacity.is_none() {
                    warn!(
                        workspace = %group.name,
                        capacity_id,
                        "workspace capacity is not visible to this principal"
                    );
                }
                capacity
            }
            None => None,
        };

        Ok(ResolvedWorkspace { group, capacity })
    }

    async fn post_import(
        &self,
        workspace_id: &str,
        package: PackageUpload,
        display_name: &str,
        options: &ImportOptions,
    ) -> Result<ImportHandle> {
        let mut url = self.endpoint(&format!("groups/{}/imports", workspace_id))?;
        url.query_pairs_mut()
            .append_pair("datasetDisplayName", display_name)
            .append_pair("nameConflict", options.name_conflict.as_str())
            .append_pair("skipReport", bool_str(options.skip_report))
            .append_pair("overrideReportLabel", bool_str(options.override_report_label))
            .append_pair("overrideModelLabel", bool_str(options.override_model_label));

        let part = Part::stream_with_length(Body::from(package.file), package.length)
            .file_name(package.file_name);
        let form = Form::new().part("file", part);

        debug!(%url, "POST import");
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await?;

        let mut handle: ImportHandle = check_status(response).await?.json().await?;
        if handle.name.is_none() {
            handle.name = Some(display_name.to_string());
        }
        Ok(handle)
    }

    async fn get_import(&self, workspace_id: &str, import_id: &str) -> Result<ImportHandle> {
        let url = self.endpoint(&format!("groups/{}/imports/{}", workspace_id, import_id))?;
        self.get_json(url).await
    }
}

/// Translate an error status into a [`DeployError`].
///
/// A JSON body becomes [`DeployError::Transport`] carrying the parsed detail;
/// anything else propagates the original reqwest error.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return Ok(response);
    }
    let status_error = response.error_for_status_ref().err();
    let body = response.text().await.unwrap_or_default();

    match (serde_json::from_str::<serde_json::Value>(&body), status_error) {
        (Ok(detail), _) => Err(DeployError::Transport {
            status: status.as_u16(),
            detail,
        }),
        (Err(_), Some(err)) => Err(DeployError::Http(err)),
        (Err(_), None) => Err(DeployError::Transport {
            status: status.as_u16(),
            detail: serde_json::Value::String(body),
        }),
    }
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
