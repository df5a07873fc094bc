use std::{fmt, time::Instant};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use prometheus::{
    Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry,
};
use tfc_exporter_core::metrics::NAMESPACE;
use tracing_subscriber::{
    EnvFilter, fmt as log_fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use super::{
    app_state::AppState,
    config::{LogFormat, LogLevel},
    logfmt::Logfmt,
};

/// Install the global subscriber. `RUST_LOG` overrides `level`.
pub fn init_tracing(level: LogLevel, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("{},tower_http=warn", level.as_str()).into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Logfmt => registry
            .with(log_fmt::layer().event_format(<Logfmt>::default()))
            .init(),
        LogFormat::Json => registry.with(log_fmt::layer().json()).init(),
    }
}

/// Instrumentation of the `/metrics` handler itself, exposed next to the
/// scraped series.
#[derive(Clone)]
pub struct HandlerMetrics {
    registry: Registry,
    requests: IntCounterVec,
    in_flight: IntGauge,
    duration: Histogram,
}

impl fmt::Debug for HandlerMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerMetrics")
            .field("in_flight", &self.in_flight.get())
            .finish_non_exhaustive()
    }
}

impl HandlerMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let requests = IntCounterVec::new(
            Opts::new(
                "http_requests_total",
                "Total number of scrapes by HTTP status code.",
            )
            .namespace(NAMESPACE)
            .subsystem("exporter"),
            &["code"],
        )?;
        let in_flight = IntGauge::with_opts(
            Opts::new(
                "http_requests_in_flight",
                "Current number of scrapes being served.",
            )
            .namespace(NAMESPACE)
            .subsystem("exporter"),
        )?;
        let duration = Histogram::with_opts(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "Duration of scrapes served by the metrics handler.",
            )
            .namespace(NAMESPACE)
            .subsystem("exporter"),
        )?;

        let registry = Registry::new();
        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(in_flight.clone()))?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self {
            registry,
            requests,
            in_flight,
            duration,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn requests_with_code(&self, code: StatusCode) -> u64 {
        self.requests
            .get_metric_with_label_values(&[code.as_str()])
            .map(|counter| counter.get())
            .unwrap_or_default()
    }

    fn begin(&self) -> InFlight<'_> {
        self.in_flight.inc();
        InFlight {
            metrics: self,
            started: Instant::now(),
        }
    }
}

struct InFlight<'a> {
    metrics: &'a HandlerMetrics,
    started: Instant,
}

impl InFlight<'_> {
    fn finish(self, status: StatusCode) {
        self.metrics
            .duration
            .observe(self.started.elapsed().as_secs_f64());
        if let Ok(counter) = self
            .metrics
            .requests
            .get_metric_with_label_values(&[status.as_str()])
        {
            counter.inc();
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.metrics.in_flight.dec();
    }
}

/// Middleware wrapped around the metrics route.
pub async fn instrument_handler(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let in_flight = state.handler_metrics.begin();
    let response = next.run(request).await;
    in_flight.finish(response.status());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_flight_gauge_returns_to_zero() {
        let metrics = HandlerMetrics::new().unwrap();
        {
            let guard = metrics.begin();
            assert_eq!(metrics.in_flight.get(), 1);
            guard.finish(StatusCode::OK);
        }
        assert_eq!(metrics.in_flight.get(), 0);
        assert_eq!(metrics.requests_with_code(StatusCode::OK), 1);
        assert_eq!(metrics.duration.get_sample_count(), 1);
    }

    #[test]
    fn abandoned_requests_are_not_counted() {
        let metrics = HandlerMetrics::new().unwrap();
        drop(metrics.begin());
        assert_eq!(metrics.in_flight.get(), 0);
        assert_eq!(metrics.requests_with_code(StatusCode::OK), 0);
    }
}
