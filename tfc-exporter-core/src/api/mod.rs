//! Terraform Cloud/Enterprise API surface consumed by the scrapers.
//!
//! [`TerraformApi`] is the capability contract the orchestration engine
//! depends on; [`TfeClient`] is the reqwest-backed implementation used in
//! production. Tests substitute in-memory fakes.

pub mod client;
mod jsonapi;
pub mod types;

use async_trait::async_trait;

pub use client::{ClientConfig, DEFAULT_ADDRESS, TfeClient};
pub use types::{
    CURRENT_RUN_INCLUDE, ListOptions, Organization, Page, Pagination, Run,
    Workspace,
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unauthorized")]
    Unauthorized,

    #[error("resource not found")]
    NotFound,

    #[error("rate limited")]
    RateLimited,

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid API address: {0}")]
    InvalidAddress(String),
}

/// Read-only view of the remote API.
///
/// Every method is a single request; implementations do not retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TerraformApi: Send + Sync {
    /// List every organization visible to the configured token.
    async fn list_organizations(&self) -> Result<Vec<Organization>, ApiError>;

    /// Read one organization by name.
    async fn read_organization(
        &self,
        name: &str,
    ) -> Result<Organization, ApiError>;

    /// List one page of workspaces belonging to `organization`.
    async fn list_workspaces(
        &self,
        organization: &str,
        options: &ListOptions,
    ) -> Result<Page<Workspace>, ApiError>;
}
