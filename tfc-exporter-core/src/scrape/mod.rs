//! Scrape orchestration: scraper contract, registry and the per-run
//! context shared by every unit of work.

mod group;
mod orchestrator;
pub mod organizations;
mod pagination;
mod resolver;
pub mod workspaces;

use std::{fmt, future::Future, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tokio_util::sync::CancellationToken;

use crate::{
    api::TerraformApi,
    error::{Result, ScrapeError},
    metrics::MetricSink,
};

pub use group::{FailFastGroup, IsolatedGroup};
pub use orchestrator::{Exporter, collector_label};
pub use organizations::OrganizationsScraper;
pub use pagination::{PageCursor, PagedListing, WalkSummary, walk};
pub use resolver::ScopeResolver;
pub use workspaces::WorkspacesScraper;

/// Everything a scraper needs for one run.
#[derive(Clone)]
pub struct ScrapeContext {
    api: Arc<dyn TerraformApi>,
    organizations: Arc<[String]>,
    page_size: u32,
    cancel: CancellationToken,
}

impl fmt::Debug for ScrapeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrapeContext")
            .field("organizations", &self.organizations)
            .field("page_size", &self.page_size)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl ScrapeContext {
    pub fn new(
        api: Arc<dyn TerraformApi>,
        organizations: Arc<[String]>,
        page_size: u32,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            api,
            organizations,
            page_size,
            cancel,
        }
    }

    pub fn api(&self) -> &dyn TerraformApi {
        self.api.as_ref()
    }

    /// The organization snapshot resolved for this run.
    pub fn organizations(&self) -> &Arc<[String]> {
        &self.organizations
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Same run, narrower cancellation scope.
    pub fn with_cancel(&self, cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..self.clone()
        }
    }

    /// Drive `fut` unless the run is cancelled first.
    pub async fn until_cancelled<F>(&self, fut: F) -> Result<F::Output>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ScrapeError::Cancelled),
            output = fut => Ok(output),
        }
    }
}

/// Label rendering of an optional timestamp: RFC 3339 with milliseconds,
/// empty when unset.
pub(crate) fn timestamp_label(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// One family of observations pulled from the remote API.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Unique name, also used in the `collector` label as `collect.<name>`.
    fn name(&self) -> &'static str;

    fn help(&self) -> &'static str;

    /// Oldest API version the scraper works against.
    fn version(&self) -> &'static str;

    async fn scrape(
        &self,
        ctx: &ScrapeContext,
        sink: &MetricSink,
    ) -> Result<()>;
}

/// Scrapers executed by every run, in registration order.
#[derive(Clone, Default)]
pub struct ScraperRegistry {
    scrapers: Vec<Arc<dyn Scraper>>,
}

impl fmt::Debug for ScraperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ScraperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Organizations first, then workspaces.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(OrganizationsScraper));
        registry.register(Arc::new(WorkspacesScraper));
        registry
    }

    /// # Panics
    ///
    /// Panics when a scraper with the same name is already registered.
    pub fn register(&mut self, scraper: Arc<dyn Scraper>) {
        assert!(
            self.scrapers.iter().all(|s| s.name() != scraper.name()),
            "scraper `{}` registered twice",
            scraper.name()
        );
        self.scrapers.push(scraper);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Scraper>> {
        self.scrapers.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.scrapers.iter().map(|s| s.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    #[async_trait]
    impl Scraper for Named {
        fn name(&self) -> &'static str {
            self.0
        }
        fn help(&self) -> &'static str {
            "test"
        }
        fn version(&self) -> &'static str {
            "v2"
        }
        async fn scrape(
            &self,
            _: &ScrapeContext,
            _: &MetricSink,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn builtin_registry_order() {
        assert_eq!(
            ScraperRegistry::builtin().names(),
            vec!["organizations", "workspaces"]
        );
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_names_panic() {
        let mut registry = ScraperRegistry::new();
        registry.register(Arc::new(Named("a")));
        registry.register(Arc::new(Named("a")));
    }
}
