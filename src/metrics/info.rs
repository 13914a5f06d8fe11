//! Info metric: a constant sample whose labels carry the information.

use crate::error::Result;
use crate::metrics::{Metric, MetricKind};
use crate::snapshot::MetricValue;

/// A metric that always reports `1`, used to expose static facts such as a
/// build version through its labels.
///
/// # Examples
///
/// ```rust
/// use registro::metrics::info::Info;
/// use registro::{Labels, Registry};
///
/// let registry = Registry::default();
/// let build = registry.add_family::<Info>("build_info", "Build metadata.", Labels::new())?;
/// build.get_or_add(&Labels::from([("version", "1.4.2")]))?;
///
/// let families = registry.collect(false);
/// assert_eq!(families[0].metrics[0].label("version"), Some("1.4.2"));
/// # Ok::<(), registro::Error>(())
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Info;

impl Info {
    /// Creates an info metric.
    pub const fn new() -> Self {
        Info
    }
}

impl Metric for Info {
    const KIND: MetricKind = MetricKind::Info;
    type Args = ();

    fn build(_args: ()) -> Result<Self> {
        Ok(Info)
    }

    fn collect(&self) -> MetricValue {
        MetricValue::Info
    }
}
