//! Metric descriptors, the per-run observation stream and exposition.

mod exporter;
pub mod exposition;
mod observation;
mod sink;

pub use exporter::ExporterMetrics;
pub(crate) use exporter::EXPORTER_SUBSYSTEM;
pub use observation::{
    MetricDesc, NAMESPACE, NOT_AVAILABLE, Observation, ValueKind, build_fq_name,
};
pub use sink::{DEFAULT_SINK_CAPACITY, MetricSink};
