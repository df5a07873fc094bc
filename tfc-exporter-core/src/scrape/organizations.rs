//! `tf_organizations_info`: one series per organization in scope.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use tracing::debug;

use super::{FailFastGroup, ScrapeContext, Scraper, timestamp_label};
use crate::{
    api::Organization,
    error::{Result, ScrapeError},
    metrics::{MetricDesc, MetricSink, Observation},
};

const SUBSYSTEM: &str = "organizations";

pub static ORGANIZATIONS_INFO: Lazy<MetricDesc> = Lazy::new(|| {
    MetricDesc::new(
        SUBSYSTEM,
        "info",
        "Information about existing organizations",
        &[
            "name",
            "created_at",
            "email",
            "external_id",
            "owners_team_saml_role_id",
            "saml_enabled",
            "two_factor_conformant",
        ],
    )
});

/// Reads every organization in scope concurrently. The first failing read
/// cancels the remaining ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrganizationsScraper;

pub fn organization_info(organization: &Organization) -> Observation {
    Observation::gauge(
        &ORGANIZATIONS_INFO,
        1.0,
        vec![
            organization.name.clone(),
            timestamp_label(organization.created_at),
            organization.email.clone(),
            organization.external_id.clone(),
            organization.owners_team_saml_role_id.clone(),
            organization.saml_enabled.to_string(),
            organization.two_factor_conformant.to_string(),
        ],
    )
}

async fn scrape_one(
    ctx: ScrapeContext,
    sink: MetricSink,
    name: String,
) -> Result<()> {
    let organization = ctx
        .until_cancelled(ctx.api().read_organization(&name))
        .await?
        .map_err(|source| ScrapeError::OrganizationRead {
            organization: name.clone(),
            source,
        })?;
    debug!(organization = %name, "read organization");
    sink.push(ctx.cancel_token(), organization_info(&organization))
        .await
}

#[async_trait]
impl Scraper for OrganizationsScraper {
    fn name(&self) -> &'static str {
        SUBSYSTEM
    }

    fn help(&self) -> &'static str {
        "Scrape information from the Organizations API: https://www.terraform.io/docs/cloud/api/organizations.html"
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
        for name in scoped.organizations().iter() {
            group.spawn(scrape_one(scoped.clone(), sink.clone(), name.clone()));
        }
        group.wait().await
    }
}
