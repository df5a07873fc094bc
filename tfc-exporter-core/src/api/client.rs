use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::{
    ApiError, TerraformApi,
    jsonapi::{self, Document, Resource},
    types::{ListOptions, Organization, Page, Workspace},
};

pub const DEFAULT_ADDRESS: &str = "https://app.terraform.io/";

const API_PATH: &str = "api/v2/";
const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

/// Connection settings for [`TfeClient`].
#[derive(Clone)]
pub struct ClientConfig {
    pub address: String,
    pub token: String,
    pub insecure_skip_verify: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            token: String::new(),
            insecure_skip_verify: false,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("address", &self.address)
            .field("token", &"<redacted>")
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .finish()
    }
}

/// Token-authenticated client for the Terraform Cloud/Enterprise v2 API.
#[derive(Clone)]
pub struct TfeClient {
    http: Client,
    base: Url,
    token: String,
}

impl fmt::Debug for TfeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TfeClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl TfeClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut address = Url::parse(&config.address).map_err(|err| {
            ApiError::InvalidAddress(format!("{}: {err}", config.address))
        })?;
        if !address.path().ends_with('/') {
            let path = format!("{}/", address.path());
            address.set_path(&path);
        }
        let base = address.join(API_PATH).map_err(|err| {
            ApiError::InvalidAddress(format!("{}: {err}", config.address))
        })?;

        let http = Client::builder()
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .user_agent(concat!("tfc-exporter/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base,
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ApiError::InvalidAddress(format!(
                    "{} cannot be a base URL",
                    self.base
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<D>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<D, ApiError>
    where
        D: DeserializeOwned,
    {
        debug!(url = %url, "requesting");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, JSON_API_MEDIA_TYPE)
            .query(query)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED => return Err(ApiError::Unauthorized),
            StatusCode::NOT_FOUND => return Err(ApiError::NotFound),
            StatusCode::TOO_MANY_REQUESTS => return Err(ApiError::RateLimited),
            status => {
                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::Parse(err.to_string()))
    }
}

#[async_trait]
impl TerraformApi for TfeClient {
    async fn list_organizations(&self) -> Result<Vec<Organization>, ApiError> {
        let url = self.endpoint(&["organizations"])?;
        let document: Document<Vec<Resource>> = self.get(url, &[]).await?;
        document.data.iter().map(jsonapi::organization).collect()
    }

    async fn read_organization(
        &self,
        name: &str,
    ) -> Result<Organization, ApiError> {
        let url = self.endpoint(&["organizations", name])?;
        let document: Document<Resource> = self.get(url, &[]).await?;
        jsonapi::organization(&document.data)
    }

    async fn list_workspaces(
        &self,
        organization: &str,
        options: &ListOptions,
    ) -> Result<Page<Workspace>, ApiError> {
        let url =
            self.endpoint(&["organizations", organization, "workspaces"])?;
        let mut query = vec![
            ("page[number]", options.page_number.to_string()),
            ("page[size]", options.page_size.to_string()),
        ];
        if let Some(include) = options.include {
            query.push(("include", include.to_string()));
        }
        let document: Document<Vec<Resource>> = self.get(url, &query).await?;
        jsonapi::workspace_page(document)
    }
}
