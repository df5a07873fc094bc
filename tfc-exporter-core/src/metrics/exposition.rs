//! Turns the observations of one run into Prometheus metric families.

use std::collections::{HashMap, hash_map::Entry};

use prometheus::{
    CounterVec, GaugeVec, Opts, Registry, TextEncoder,
    proto::MetricFamily,
};
use tracing::warn;

use super::{ExporterMetrics, Observation, ValueKind};

enum Family {
    Counter(CounterVec),
    Gauge(GaugeVec),
}

impl Family {
    fn new(observation: &Observation) -> prometheus::Result<Self> {
        let desc = observation.desc();
        let opts = Opts::new(desc.fq_name(), desc.help());
        Ok(match observation.kind() {
            ValueKind::Counter => {
                Family::Counter(CounterVec::new(opts, desc.label_names())?)
            }
            ValueKind::Gauge => {
                Family::Gauge(GaugeVec::new(opts, desc.label_names())?)
            }
        })
    }

    fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        match self {
            Family::Counter(vec) => registry.register(Box::new(vec.clone())),
            Family::Gauge(vec) => registry.register(Box::new(vec.clone())),
        }
    }

    fn record(&self, observation: &Observation) -> prometheus::Result<()> {
        let labels: Vec<&str> = observation
            .label_values()
            .iter()
            .map(String::as_str)
            .collect();
        match self {
            Family::Counter(vec) => {
                let value = observation.value();
                if value < 0.0 {
                    warn!(
                        metric = observation.desc().fq_name(),
                        value, "dropping negative counter observation"
                    );
                    return Ok(());
                }
                vec.get_metric_with_label_values(&labels[..])?.inc_by(value);
            }
            Family::Gauge(vec) => {
                vec.get_metric_with_label_values(&labels[..])?
                    .set(observation.value());
            }
        }
        Ok(())
    }
}

/// Build a fresh registry holding `observations` and the carried-over
/// bookkeeping series.
///
/// Observations that do not fit their family (label cardinality mismatch)
/// are logged and skipped instead of failing the whole exposition.
pub fn run_registry(
    observations: &[Observation],
    exporter: &ExporterMetrics,
) -> prometheus::Result<Registry> {
    let registry = Registry::new();
    let mut families: HashMap<&str, Family> = HashMap::new();

    for observation in observations {
        let name = observation.desc().fq_name();
        let family = match families.entry(name) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let family = Family::new(observation)?;
                family.register(&registry)?;
                entry.insert(family)
            }
        };
        if let Err(err) = family.record(observation) {
            warn!(metric = name, error = %err, "skipping observation");
        }
    }

    exporter.register(&registry)?;
    Ok(registry)
}

/// Encode metric families in the Prometheus text format.
pub fn encode_text(families: &[MetricFamily]) -> prometheus::Result<String> {
    TextEncoder::new().encode_to_string(families)
}

/// Content type of [`encode_text`] output.
pub fn text_content_type() -> &'static str {
    prometheus::TEXT_FORMAT
}
