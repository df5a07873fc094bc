/// Common namespace of every metric this exporter produces.
pub const NAMESPACE: &str = "tf";

/// Placeholder label value for fields of an absent nested object.
pub const NOT_AVAILABLE: &str = "na";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Counter,
    Gauge,
}

/// Identity of a metric family: fully qualified name, help and the
/// ordered variable label names.
#[derive(Debug, PartialEq, Eq)]
pub struct MetricDesc {
    fq_name: String,
    help: &'static str,
    label_names: &'static [&'static str],
}

impl MetricDesc {
    pub fn new(
        subsystem: &str,
        name: &str,
        help: &'static str,
        label_names: &'static [&'static str],
    ) -> Self {
        Self {
            fq_name: build_fq_name(NAMESPACE, subsystem, name),
            help,
            label_names,
        }
    }

    pub fn fq_name(&self) -> &str {
        &self.fq_name
    }

    pub fn help(&self) -> &'static str {
        self.help
    }

    pub fn label_names(&self) -> &'static [&'static str] {
        self.label_names
    }
}

/// Joins the non-empty name parts with underscores.
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// One labeled data point. Label values line up with the descriptor's
/// label names.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    desc: &'static MetricDesc,
    kind: ValueKind,
    value: f64,
    label_values: Vec<String>,
}

impl Observation {
    pub fn new(
        desc: &'static MetricDesc,
        kind: ValueKind,
        value: f64,
        label_values: Vec<String>,
    ) -> Self {
        debug_assert_eq!(
            desc.label_names.len(),
            label_values.len(),
            "label cardinality mismatch for {}",
            desc.fq_name
        );
        Self {
            desc,
            kind,
            value,
            label_values,
        }
    }

    pub fn gauge(
        desc: &'static MetricDesc,
        value: f64,
        label_values: Vec<String>,
    ) -> Self {
        Self::new(desc, ValueKind::Gauge, value, label_values)
    }

    pub fn counter(
        desc: &'static MetricDesc,
        value: f64,
        label_values: Vec<String>,
    ) -> Self {
        Self::new(desc, ValueKind::Counter, value, label_values)
    }

    pub fn desc(&self) -> &'static MetricDesc {
        self.desc
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    /// Value of the label called `name`, if the descriptor has one.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.desc
            .label_names
            .iter()
            .position(|label| *label == name)
            .and_then(|idx| self.label_values.get(idx))
            .map(String::as_str)
    }
}
