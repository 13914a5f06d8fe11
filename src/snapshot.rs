//! Snapshot types produced by collection.
//!
//! A [`MetricFamily`] is what every [`Collectable`](crate::Collectable) returns:
//! name, help text, kind and one [`ClientMetric`] per label set. These types are
//! plain data; rendering them into an exposition format is left to the caller.
//!
//! # Feature Flag
//!
//! With the `serde` feature every snapshot type derives `Serialize` and
//! `Deserialize`:
//!
//! ```toml
//! [dependencies]
//! registro = { version = "0.1", features = ["serde"] }
//! ```

use crate::metrics::MetricKind;

/// A collected family: every sample of one metric name.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricFamily {
    /// The family name.
    pub name: String,
    /// The help text.
    pub help: String,
    /// The metric kind shared by every sample.
    pub kind: MetricKind,
    /// One entry per label set.
    pub metrics: Vec<ClientMetric>,
}

impl MetricFamily {
    /// Finds the sample whose labels contain every given pair.
    pub fn find(&self, labels: &[(&str, &str)]) -> Option<&ClientMetric> {
        self.metrics.iter().find(|metric| {
            labels
                .iter()
                .all(|(name, value)| metric.label(name) == Some(*value))
        })
    }
}

/// A single collected sample.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientMetric {
    /// Constant labels first, then instance labels.
    pub labels: Vec<LabelPair>,
    /// The kind-specific payload.
    pub value: MetricValue,
}

impl ClientMetric {
    /// Returns the value of a label attached to this sample.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|pair| pair.name == name)
            .map(|pair| pair.value.as_str())
    }
}

/// A label attached to a collected sample.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LabelPair {
    /// The label name.
    pub name: String,
    /// The label value.
    pub value: String,
}

impl LabelPair {
    /// Creates a new label pair.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The payload of a collected sample.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetricValue {
    /// Current counter value.
    Counter(f64),
    /// Current gauge value.
    Gauge(f64),
    /// Cumulative histogram buckets, count and sum.
    Histogram(HistogramValue),
    /// Quantile estimates, count and sum.
    Summary(SummaryValue),
    /// Info metrics always report one.
    Info,
}

impl MetricValue {
    /// Returns the scalar value of counters, gauges and infos.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Counter(v) | MetricValue::Gauge(v) => Some(*v),
            MetricValue::Info => Some(1.0),
            MetricValue::Histogram(_) | MetricValue::Summary(_) => None,
        }
    }
}

/// Collected state of a histogram.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistogramValue {
    /// Total number of observations.
    pub sample_count: u64,
    /// Sum of all observed values.
    pub sample_sum: f64,
    /// Buckets in ascending upper-bound order, the last one at +Inf.
    pub buckets: Vec<Bucket>,
}

/// One cumulative histogram bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bucket {
    /// Number of observations less than or equal to `upper_bound`.
    pub cumulative_count: u64,
    /// Inclusive upper bound of the bucket.
    pub upper_bound: f64,
}

/// Collected state of a summary.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SummaryValue {
    /// Total number of observations.
    pub sample_count: u64,
    /// Sum of all observed values.
    pub sample_sum: f64,
    /// Estimates in the order the quantiles were configured.
    pub quantiles: Vec<QuantileValue>,
}

/// One quantile estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantileValue {
    /// The target quantile in `[0, 1]`.
    pub quantile: f64,
    /// The estimate, NaN when there were no observations in the window.
    pub value: f64,
}
