//! Metric primitives and the capability traits shared by families and the registry.
//!
//! Every metric type owns its numeric state and is independently thread-safe:
//! handles are shared through `Arc` and mutated through `&self`.
//!
//! | Type | Kind | State |
//! |------|------|-------|
//! | [`Counter`](counter::Counter) | [`MetricKind::Counter`] | one atomic word, never decreases |
//! | [`Gauge`](gauge::Gauge) | [`MetricKind::Gauge`] | one atomic word |
//! | [`Histogram`](histogram::Histogram) | [`MetricKind::Histogram`] | one atomic per bucket plus a running sum |
//! | [`Summary`](summary::Summary) | [`MetricKind::Summary`] | windowed quantile streams behind a mutex |
//! | [`Info`](info::Info) | [`MetricKind::Info`] | none, the labels carry the data |
//!
//! # Capabilities
//!
//! Families and the registry are generic over [`Metric`]. Mutation through the
//! registry is expressed with the capability traits [`Increment`], [`Decrement`],
//! [`Set`] and [`Observe`], so one generic code path serves every metric kind
//! that supports the operation:
//!
//! ```rust
//! use registro::metrics::{counter::Counter, gauge::Gauge};
//! use registro::{Labels, Registry};
//!
//! let registry = Registry::default();
//! registry.add_family::<Counter>("jobs_total", "Jobs run.", Labels::new())?;
//! registry.add_family::<Gauge>("queue_depth", "Queued jobs.", Labels::new())?;
//!
//! let labels = Labels::from([("queue", "default")]);
//! registry.inc::<Counter>("jobs_total", &labels, 1.0, ())?;
//! registry.set::<Gauge>("queue_depth", &labels, 12.0, ())?;
//! registry.dec::<Gauge>("queue_depth", &labels, 2.0, ())?;
//!
//! let depth = registry.get_or_add_metric::<Gauge>("queue_depth", &labels, ())?;
//! assert_eq!(depth.value(), 10.0);
//! # Ok::<(), registro::Error>(())
//! ```

pub mod counter;
pub mod gauge;
pub mod histogram;
pub mod info;
pub mod summary;

use std::fmt::{self, Display};

use crate::error::Result;
use crate::registry::sealed::Registrable;
use crate::snapshot::MetricValue;

/// The type of a metric family.
///
/// A family name is bound to exactly one kind within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MetricKind {
    /// Monotonically increasing value.
    Counter,
    /// Value that can go up and down.
    Gauge,
    /// Bucketed distribution of observations.
    Histogram,
    /// Quantile estimates over a sliding time window.
    Summary,
    /// Constant value of one, described by its labels.
    Info,
}

impl MetricKind {
    /// Returns the lowercase name of the kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Summary => "summary",
            MetricKind::Info => "info",
        }
    }
}

impl Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric type that can live in a [`Family`](crate::Family) and a
/// [`Registry`](crate::Registry).
///
/// This trait is sealed: the registry keeps one family map per implementor.
pub trait Metric: Registrable + Send + Sync + Sized + 'static {
    /// The kind reported in collected families.
    const KIND: MetricKind;

    /// Arguments needed to construct a new instance, e.g. bucket boundaries.
    type Args: Default;

    /// Constructs a new instance for a label set seen for the first time.
    fn build(args: Self::Args) -> Result<Self>;

    /// Returns a snapshot of the current value without mutating it.
    fn collect(&self) -> MetricValue;
}

/// Metrics that can be increased by an arbitrary amount.
pub trait Increment {
    /// Adds `value` to the metric.
    fn increment_by(&self, value: f64);
}

/// Metrics that can be decreased by an arbitrary amount.
pub trait Decrement {
    /// Subtracts `value` from the metric.
    fn decrement_by(&self, value: f64);
}

/// Metrics that can be overwritten.
pub trait Set {
    /// Replaces the current value.
    fn set(&self, value: f64);
}

/// Metrics that record individual observations.
pub trait Observe {
    /// Records one observation.
    fn observe(&self, value: f64);
}
