//! Gauge backed by a single atomic word.
//!
//! This module provides [`Gauge`], a value that can arbitrarily go up and down.
//! The `f64` value is stored as its bit pattern in one cache-padded
//! `AtomicU64`; additions are compare-and-swap loops, so concurrent updates are
//! never lost and no intermediate state is observable.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crossbeam_utils::CachePadded;

use crate::error::Result;
use crate::metrics::{Decrement, Increment, Metric, MetricKind, Set};
use crate::snapshot::MetricValue;

/// A metric that represents a single value that can go up and down.
///
/// Gauges are typically used for measured values like temperatures or current
/// memory usage, but also for counts that can go up and down, like the number
/// of in-flight requests.
///
/// # Examples
///
/// ```rust
/// use registro::metrics::gauge::Gauge;
///
/// let in_flight = Gauge::new();
/// in_flight.increment();
/// in_flight.increment();
/// in_flight.decrement();
/// assert_eq!(in_flight.value(), 1.0);
///
/// in_flight.set(-2.5);
/// assert_eq!(in_flight.value(), -2.5);
/// ```
///
/// Multi-threaded usage:
///
/// ```rust
/// use registro::metrics::gauge::Gauge;
/// use std::sync::Arc;
/// use std::thread;
///
/// let gauge = Arc::new(Gauge::new());
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         let g = Arc::clone(&gauge);
///         thread::spawn(move || {
///             for _ in 0..1000 {
///                 g.increment();
///             }
///         })
///     })
///     .collect();
///
/// for h in handles {
///     h.join().unwrap();
/// }
///
/// assert_eq!(gauge.value(), 4000.0);
/// ```
pub struct Gauge {
    bits: CachePadded<AtomicU64>,
}

impl Gauge {
    /// Creates a gauge that starts at zero.
    pub const fn new() -> Self {
        // 0.0_f64 has an all-zero bit pattern.
        Gauge {
            bits: CachePadded::new(AtomicU64::new(0)),
        }
    }

    /// Creates a gauge that starts at the given value.
    pub fn with_value(value: f64) -> Self {
        Gauge {
            bits: CachePadded::new(AtomicU64::new(value.to_bits())),
        }
    }

    /// Increments the gauge by one.
    #[inline]
    pub fn increment(&self) {
        self.change(1.0);
    }

    /// Increments the gauge by the given amount, which may be negative.
    #[inline]
    pub fn increment_by(&self, value: f64) {
        self.change(value);
    }

    /// Decrements the gauge by one.
    #[inline]
    pub fn decrement(&self) {
        self.change(-1.0);
    }

    /// Decrements the gauge by the given amount.
    #[inline]
    pub fn decrement_by(&self, value: f64) {
        self.change(-value);
    }

    /// Overwrites the current value.
    #[inline]
    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Sets the gauge to the current UNIX time in seconds.
    ///
    /// A clock set before the epoch yields zero.
    pub fn set_to_current_time(&self) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        self.set(now);
    }

    /// Returns the current value.
    #[inline]
    pub fn value(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Returns a snapshot of the current value.
    pub fn collect(&self) -> MetricValue {
        MetricValue::Gauge(self.value())
    }

    #[inline]
    fn change(&self, delta: f64) {
        // The closure never returns None, so the update always succeeds.
        let _ = self
            .bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((f64::from_bits(bits) + delta).to_bits())
            });
    }
}

impl Metric for Gauge {
    const KIND: MetricKind = MetricKind::Gauge;
    type Args = ();

    fn build(_args: ()) -> Result<Self> {
        Ok(Gauge::new())
    }

    fn collect(&self) -> MetricValue {
        Gauge::collect(self)
    }
}

impl Increment for Gauge {
    fn increment_by(&self, value: f64) {
        Gauge::increment_by(self, value);
    }
}

impl Decrement for Gauge {
    fn decrement_by(&self, value: f64) {
        Gauge::decrement_by(self, value);
    }
}

impl Set for Gauge {
    fn set(&self, value: f64) {
        Gauge::set(self, value);
    }
}

impl Default for Gauge {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Gauge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gauge").field("value", &self.value()).finish()
    }
}
