use std::fmt;

use prometheus::{Gauge, IntCounter, IntCounterVec, Opts, Registry};

use super::NAMESPACE;

pub(crate) const EXPORTER_SUBSYSTEM: &str = "exporter";

/// Run-level bookkeeping series whose values carry over between requests.
#[derive(Clone)]
pub struct ExporterMetrics {
    pub total_scrapes: IntCounter,
    pub scrape_errors: IntCounterVec,
    pub last_scrape_error: Gauge,
}

impl fmt::Debug for ExporterMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExporterMetrics")
            .field("total_scrapes", &self.total_scrapes.get())
            .field("last_scrape_error", &self.last_scrape_error.get())
            .finish_non_exhaustive()
    }
}

impl ExporterMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let total_scrapes = IntCounter::with_opts(
            Opts::new(
                "scrapes_total",
                "Total number of times the Terraform API was scraped for metrics.",
            )
            .namespace(NAMESPACE)
            .subsystem(EXPORTER_SUBSYSTEM),
        )?;
        let scrape_errors = IntCounterVec::new(
            Opts::new(
                "scrape_errors_total",
                "Total number of times an error occurred scraping the Terraform API.",
            )
            .namespace(NAMESPACE)
            .subsystem(EXPORTER_SUBSYSTEM),
            &["collector"],
        )?;
        let last_scrape_error = Gauge::with_opts(
            Opts::new(
                "last_scrape_error",
                "Whether the last scrape of metrics from Terraform API resulted in an error (1 for error, 0 for success).",
            )
            .namespace(NAMESPACE)
            .subsystem(EXPORTER_SUBSYSTEM),
        )?;

        Ok(Self {
            total_scrapes,
            scrape_errors,
            last_scrape_error,
        })
    }

    /// Register handles to these series in `registry`. The values stay
    /// shared with `self`.
    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.total_scrapes.clone()))?;
        registry.register(Box::new(self.last_scrape_error.clone()))?;
        registry.register(Box::new(self.scrape_errors.clone()))?;
        Ok(())
    }

    pub fn scrape_error_count(&self, collector: &str) -> u64 {
        self.scrape_errors
            .get_metric_with_label_values(&[collector])
            .map(|counter| counter.get())
            .unwrap_or_default()
    }
}
