//! Monotonically increasing counter.
//!
//! [`Counter`] is a restricted view over a [`Gauge`]: it only accepts
//! non-negative increments and can only go back to zero through
//! [`reset`](Counter::reset).

use std::fmt::Debug;

use crate::error::Result;
use crate::metrics::gauge::Gauge;
use crate::metrics::{Increment, Metric, MetricKind};
use crate::snapshot::MetricValue;

/// A counter that only goes up, except when explicitly reset.
///
/// # Examples
///
/// ```rust
/// use registro::metrics::counter::Counter;
///
/// let requests = Counter::new();
/// requests.increment();
/// requests.increment_by(4.0);
/// requests.increment_by(-10.0); // ignored
/// assert_eq!(requests.value(), 5.0);
///
/// requests.reset();
/// assert_eq!(requests.value(), 0.0);
/// ```
pub struct Counter {
    gauge: Gauge,
}

impl Counter {
    /// Creates a counter that starts at zero.
    pub const fn new() -> Self {
        Counter {
            gauge: Gauge::new(),
        }
    }

    /// Increments the counter by one.
    #[inline]
    pub fn increment(&self) {
        self.gauge.increment();
    }

    /// Increments the counter by the given amount.
    ///
    /// Negative and NaN amounts are ignored.
    #[inline]
    pub fn increment_by(&self, value: f64) {
        if value > 0.0 {
            self.gauge.increment_by(value);
        }
    }

    /// Returns the current value.
    #[inline]
    pub fn value(&self) -> f64 {
        self.gauge.value()
    }

    /// Sets the counter back to zero.
    pub fn reset(&self) {
        self.gauge.set(0.0);
    }

    /// Returns a snapshot of the current value.
    pub fn collect(&self) -> MetricValue {
        MetricValue::Counter(self.value())
    }
}

impl Metric for Counter {
    const KIND: MetricKind = MetricKind::Counter;
    type Args = ();

    fn build(_args: ()) -> Result<Self> {
        Ok(Counter::new())
    }

    fn collect(&self) -> MetricValue {
        Counter::collect(self)
    }
}

impl Increment for Counter {
    fn increment_by(&self, value: f64) {
        Counter::increment_by(self, value);
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Counter").field("value", &self.value()).finish()
    }
}
