use std::{panic::AssertUnwindSafe, sync::Arc, time::Instant};

use futures::FutureExt;
use once_cell::sync::Lazy;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info_span};

use super::{
    IsolatedGroup, ScopeResolver, ScrapeContext, Scraper, ScraperRegistry,
};
use crate::{
    api::TerraformApi,
    error::ScrapeError,
    metrics::{
        DEFAULT_SINK_CAPACITY, EXPORTER_SUBSYSTEM, ExporterMetrics, MetricDesc,
        MetricSink, Observation,
    },
};

pub static COLLECTOR_DURATION: Lazy<MetricDesc> = Lazy::new(|| {
    MetricDesc::new(
        EXPORTER_SUBSYSTEM,
        "collector_duration_seconds",
        "Collector time duration.",
        &["collector"],
    )
});

/// Value of the `collector` label for a scraper.
pub fn collector_label(name: &str) -> String {
    format!("collect.{name}")
}

/// Runs every registered scraper against the resolved organizations.
///
/// Cheap to clone; clones share the organization cache and the run-level
/// bookkeeping series.
#[derive(Clone)]
pub struct Exporter {
    api: Arc<dyn TerraformApi>,
    resolver: Arc<ScopeResolver>,
    scrapers: ScraperRegistry,
    metrics: ExporterMetrics,
    page_size: u32,
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("resolver", &self.resolver)
            .field("scrapers", &self.scrapers)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl Exporter {
    pub fn new(
        api: Arc<dyn TerraformApi>,
        resolver: ScopeResolver,
        scrapers: ScraperRegistry,
        page_size: u32,
    ) -> prometheus::Result<Self> {
        Ok(Self {
            api,
            resolver: Arc::new(resolver),
            scrapers,
            metrics: ExporterMetrics::new()?,
            page_size,
        })
    }

    pub fn metrics(&self) -> &ExporterMetrics {
        &self.metrics
    }

    /// Scrapers executed by every run.
    pub fn scrapers(&self) -> &ScraperRegistry {
        &self.scrapers
    }

    fn count_error(&self, collector: &str) {
        match self
            .metrics
            .scrape_errors
            .get_metric_with_label_values(&[collector])
        {
            Ok(counter) => counter.inc(),
            Err(err) => {
                error!(error = %err, "scrape error counter unavailable")
            }
        }
    }

    fn set_last_error(&self, failed: bool) {
        self.metrics
            .last_scrape_error
            .set(if failed { 1.0 } else { 0.0 });
    }

    /// Perform one scrape run, streaming observations into `sink`.
    ///
    /// Returns once every scraper task has finished. Scraper failures are
    /// recorded in the bookkeeping series and never returned.
    pub async fn scrape(
        &self,
        cancel: &CancellationToken,
        sink: MetricSink,
    ) {
        self.metrics.total_scrapes.inc();

        let organizations =
            match self.resolver.resolve(self.api.as_ref(), cancel).await {
                Ok(organizations) => organizations,
                Err(err) => {
                    self.set_last_error(true);
                    error!(error = %err, "unable to resolve organizations");
                    return;
                }
            };
        self.set_last_error(false);

        let ctx = ScrapeContext::new(
            Arc::clone(&self.api),
            organizations,
            self.page_size,
            cancel.clone(),
        );

        let mut group = IsolatedGroup::new();
        for scraper in self.scrapers.iter() {
            let scraper = Arc::clone(scraper);
            let ctx = ctx.clone();
            let sink = sink.clone();
            let exporter = self.clone();
            let span = info_span!("scraper", scraper = scraper.name());
            group.spawn(
                async move {
                    exporter.run_scraper(scraper.as_ref(), &ctx, &sink).await;
                    Ok(())
                }
                .instrument(span),
            );
        }
        drop(sink);

        for joined in group.join().await {
            if let Err(err) = joined {
                error!(error = %err, "scraper task failed");
                self.set_last_error(true);
            }
        }
    }

    async fn run_scraper(
        &self,
        scraper: &dyn Scraper,
        ctx: &ScrapeContext,
        sink: &MetricSink,
    ) {
        let label = collector_label(scraper.name());
        let started = Instant::now();

        let outcome = AssertUnwindSafe(scraper.scrape(ctx, sink))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(ScrapeError::TaskFailed(format!(
                    "scraper {} panicked",
                    scraper.name()
                )))
            });

        match outcome {
            Ok(()) => debug!("scraper finished"),
            Err(err) => {
                error!(
                    scraper = scraper.name(),
                    error = %err,
                    "error scraping"
                );
                self.count_error(&label);
                self.set_last_error(true);
            }
        }

        sink.emit(Observation::gauge(
            &COLLECTOR_DURATION,
            started.elapsed().as_secs_f64(),
            vec![label],
        ))
        .await;
    }

    /// Run [`Exporter::scrape`] and gather everything it emitted.
    pub async fn collect(
        &self,
        cancel: &CancellationToken,
    ) -> Vec<Observation> {
        let (sink, mut rx) = MetricSink::channel(DEFAULT_SINK_CAPACITY);
        let drain = async {
            let mut observations = Vec::new();
            while let Some(observation) = rx.recv().await {
                observations.push(observation);
            }
            observations
        };
        let ((), observations) = tokio::join!(self.scrape(cancel, sink), drain);
        observations
    }
}
