use std::fmt;

use tfc_exporter_core::scrape::Exporter;

use super::telemetry::HandlerMetrics;

#[derive(Clone)]
pub struct AppState {
    pub exporter: Exporter,
    pub handler_metrics: HandlerMetrics,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(exporter: Exporter) -> prometheus::Result<Self> {
        Ok(Self {
            exporter,
            handler_metrics: HandlerMetrics::new()?,
        })
    }
}
