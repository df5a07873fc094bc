//! `tf_workspaces_info`: one series per workspace, walked page by page.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use tracing::debug;

use super::{
    FailFastGroup, PagedListing, ScrapeContext, Scraper, timestamp_label,
    walk,
};
use crate::{
    api::{
        ApiError, CURRENT_RUN_INCLUDE, ListOptions, Page, TerraformApi,
        Workspace,
    },
    error::Result,
    metrics::{MetricDesc, MetricSink, NOT_AVAILABLE, Observation},
};

const SUBSYSTEM: &str = "workspaces";

pub static WORKSPACES_INFO: Lazy<MetricDesc> = Lazy::new(|| {
    MetricDesc::new(
        SUBSYSTEM,
        "info",
        "Information about existing workspaces",
        &[
            "id",
            "name",
            "organization",
            "terraform_version",
            "created_at",
            "environment",
            "current_run",
            "current_run_status",
            "current_run_created_at",
        ],
    )
});

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkspacesScraper;

/// Workspace listing of one organization, expanded with the current run.
pub struct WorkspaceListing<'a> {
    api: &'a dyn TerraformApi,
    organization: &'a str,
}

impl std::fmt::Debug for WorkspaceListing<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceListing")
            .field("organization", &self.organization)
            .finish_non_exhaustive()
    }
}

impl<'a> WorkspaceListing<'a> {
    pub fn new(api: &'a dyn TerraformApi, organization: &'a str) -> Self {
        Self { api, organization }
    }
}

#[async_trait]
impl PagedListing for WorkspaceListing<'_> {
    type Item = Workspace;

    fn organization(&self) -> &str {
        self.organization
    }

    async fn fetch_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> std::result::Result<Page<Workspace>, ApiError> {
        let options = ListOptions::page(page_number, page_size)
            .with_include(CURRENT_RUN_INCLUDE);
        let mut page =
            self.api.list_workspaces(self.organization, &options).await?;
        // The relationship is optional in responses; the listing scope is not.
        for workspace in &mut page.items {
            if workspace.organization.is_empty() {
                workspace.organization = self.organization.to_string();
            }
        }
        Ok(page)
    }
}

pub fn workspace_info(workspace: &Workspace) -> Observation {
    let (run_id, run_status, run_created_at) = match &workspace.current_run {
        Some(run) => (
            run.id.clone(),
            run.status.clone().unwrap_or_default(),
            timestamp_label(run.created_at),
        ),
        None => (
            NOT_AVAILABLE.to_string(),
            NOT_AVAILABLE.to_string(),
            NOT_AVAILABLE.to_string(),
        ),
    };

    Observation::gauge(
        &WORKSPACES_INFO,
        1.0,
        vec![
            workspace.id.clone(),
            workspace.name.clone(),
            workspace.organization.clone(),
            workspace.terraform_version.clone(),
            timestamp_label(workspace.created_at),
            workspace.environment.clone(),
            run_id,
            run_status,
            run_created_at,
        ],
    )
}

async fn scrape_one(
    ctx: ScrapeContext,
    sink: MetricSink,
    organization: String,
) -> Result<()> {
    let listing = WorkspaceListing::new(ctx.api(), &organization);
    let summary = walk(&listing, &ctx, &sink, workspace_info).await?;
    debug!(
        organization = %organization,
        pages = summary.pages,
        workspaces = summary.items,
        "listed workspaces"
    );
    Ok(())
}

#[async_trait]
impl Scraper for WorkspacesScraper {
    fn name(&self) -> &'static str {
        SUBSYSTEM
    }

    fn help(&self) -> &'static str {
        "Scrape information from the Workspaces API: https://www.terraform.io/docs/cloud/api/workspaces.html"
    }

    fn version(&self) -> &'static str {
        "v2"
    }

    async fn scrape(
        &self,
        ctx: &ScrapeContext,
        sink: &MetricSink,
    ) -> Result<()> {
        let mut group = FailFastGroup::new(ctx.cancel_token());
        let scoped = ctx.with_cancel(group.token());
        for organization in scoped.organizations().iter() {
            group.spawn(scrape_one(
                scoped.clone(),
                sink.clone(),
                organization.clone(),
            ));
        }
        group.wait().await
    }
}
