//! Histogram with fixed, strictly increasing bucket boundaries.
//!
//! This module provides [`Histogram`], which counts observations into buckets
//! and keeps a running sum.
//!
//! # Concurrency
//!
//! ```text
//!   observe(v) ──binary search──► bucket[i].fetch_add(1)    (lock-free)
//!              └─────────────────► sum += v                 (lock-free)
//!
//!   observe_multiple ┐
//!   reset            ├─ under one mutex, consistent across all buckets + sum
//!   collect          ┘
//! ```
//!
//! A single `observe` updates its bucket and the sum with two independent
//! atomics. The bulk path, `reset` and `collect` are serialized by a mutex so
//! that they act on all buckets and the sum as a unit.

use std::fmt::Debug;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::metrics::gauge::Gauge;
use crate::metrics::{Metric, MetricKind, Observe};
use crate::snapshot::{Bucket, HistogramValue, MetricValue};

/// Upper bounds of the finite histogram buckets.
///
/// The implicit last bucket is always `+Inf` and is not part of this list.
///
/// # Examples
///
/// ```rust
/// use registro::metrics::histogram::BucketBoundaries;
///
/// let linear = BucketBoundaries::linear(1.0, 1.0, 3);
/// assert_eq!(linear.as_slice(), &[1.0, 2.0, 3.0]);
///
/// let exponential = BucketBoundaries::exponential(1.0, 10.0, 3);
/// assert_eq!(exponential.as_slice(), &[1.0, 10.0, 100.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BucketBoundaries(Vec<f64>);

impl BucketBoundaries {
    /// Conventional buckets for latencies measured in seconds.
    pub const DEFAULT: [f64; 11] = [
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    /// Creates boundaries from the given values, unchecked until a histogram is built.
    pub fn new(boundaries: impl Into<Vec<f64>>) -> Self {
        Self(boundaries.into())
    }

    /// `count` buckets, the first at `start`, each `width` wider than the previous.
    pub fn linear(start: f64, width: f64, count: usize) -> Self {
        Self((0..count).map(|i| start + width * i as f64).collect())
    }

    /// `count` buckets, the first at `start`, each `factor` times the previous.
    pub fn exponential(start: f64, factor: f64, count: usize) -> Self {
        let mut next = start;
        Self(
            (0..count)
                .map(|_| {
                    let current = next;
                    next *= factor;
                    current
                })
                .collect(),
        )
    }

    /// Returns the boundaries as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Returns `true` if every boundary is strictly greater than the previous one.
    ///
    /// NaN boundaries never compare as increasing.
    pub fn is_strictly_increasing(&self) -> bool {
        self.0.iter().all(|b| !b.is_nan()) && self.0.windows(2).all(|w| w[0] < w[1])
    }
}

impl Default for BucketBoundaries {
    fn default() -> Self {
        Self(Self::DEFAULT.to_vec())
    }
}

impl Deref for BucketBoundaries {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for BucketBoundaries {
    fn from(boundaries: Vec<f64>) -> Self {
        Self(boundaries)
    }
}

impl<const N: usize> From<[f64; N]> for BucketBoundaries {
    fn from(boundaries: [f64; N]) -> Self {
        Self(boundaries.to_vec())
    }
}

/// A histogram counting observations into cumulative buckets.
///
/// # Examples
///
/// ```rust
/// use registro::metrics::histogram::Histogram;
/// use registro::snapshot::MetricValue;
///
/// let latency = Histogram::new([0.1, 0.5, 1.0])?;
/// for v in [0.05, 0.1, 0.3, 2.0] {
///     latency.observe(v);
/// }
///
/// let MetricValue::Histogram(snapshot) = latency.collect() else { unreachable!() };
/// let counts: Vec<u64> = snapshot.buckets.iter().map(|b| b.cumulative_count).collect();
/// assert_eq!(counts, [2, 3, 3, 4]);
/// assert_eq!(snapshot.sample_count, 4);
/// # Ok::<(), registro::Error>(())
/// ```
pub struct Histogram {
    boundaries: BucketBoundaries,
    counts: Box<[CachePadded<AtomicU64>]>,
    sum: Gauge,
    lock: Mutex<()>,
}

impl Histogram {
    /// Creates a histogram with the given finite bucket boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsortedBoundaries`] if the boundaries are not strictly
    /// increasing.
    pub fn new(boundaries: impl Into<BucketBoundaries>) -> Result<Self> {
        let boundaries = boundaries.into();
        if !boundaries.is_strictly_increasing() {
            return Err(Error::UnsortedBoundaries);
        }
        let counts = (0..=boundaries.len())
            .map(|_| CachePadded::new(AtomicU64::new(0)))
            .collect();
        Ok(Histogram {
            boundaries,
            counts,
            sum: Gauge::new(),
            lock: Mutex::new(()),
        })
    }

    /// Records one observation.
    ///
    /// The value goes into the first bucket whose upper bound is greater than
    /// or equal to it; a value equal to a boundary belongs to that boundary's
    /// bucket. NaN goes into the `+Inf` bucket.
    #[inline]
    pub fn observe(&self, value: f64) {
        let index = self.bucket_index(value);
        self.sum.increment_by(value);
        self.counts[index].fetch_add(1, Ordering::Relaxed);
    }

    /// Records pre-aggregated observations.
    ///
    /// `bucket_increments` holds one raw (non-cumulative) count per bucket,
    /// including the `+Inf` bucket. All buckets and the sum are updated as one
    /// unit with respect to [`collect`](Self::collect) and [`reset`](Self::reset).
    ///
    /// # Errors
    ///
    /// Returns [`Error::BucketCountMismatch`] if the number of increments is
    /// not [`bucket_count`](Self::bucket_count); the histogram is left unchanged.
    pub fn observe_multiple(&self, bucket_increments: &[u64], sum_of_values: f64) -> Result<()> {
        if bucket_increments.len() != self.counts.len() {
            return Err(Error::BucketCountMismatch {
                expected: self.counts.len(),
                actual: bucket_increments.len(),
            });
        }

        let _guard = self.lock.lock();
        self.sum.increment_by(sum_of_values);
        for (count, increment) in self.counts.iter().zip(bucket_increments) {
            count.fetch_add(*increment, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Zeroes every bucket and the sum.
    pub fn reset(&self) {
        let _guard = self.lock.lock();
        for count in self.counts.iter() {
            count.store(0, Ordering::Relaxed);
        }
        self.sum.set(0.0);
    }

    /// Returns the cumulative bucket counts, the total count and the sum.
    pub fn collect(&self) -> MetricValue {
        let _guard = self.lock.lock();

        let mut cumulative_count = 0u64;
        let buckets = self
            .counts
            .iter()
            .enumerate()
            .map(|(i, count)| {
                cumulative_count += count.load(Ordering::Relaxed);
                Bucket {
                    cumulative_count,
                    upper_bound: self.boundaries.get(i).copied().unwrap_or(f64::INFINITY),
                }
            })
            .collect();

        MetricValue::Histogram(HistogramValue {
            sample_count: cumulative_count,
            sample_sum: self.sum.value(),
            buckets,
        })
    }

    /// Returns the number of buckets, including `+Inf`.
    pub fn bucket_count(&self) -> usize {
        self.counts.len()
    }

    /// Returns the finite bucket boundaries.
    pub fn boundaries(&self) -> &BucketBoundaries {
        &self.boundaries
    }

    /// Index of the first boundary `>= value`, or the `+Inf` bucket.
    #[inline]
    fn bucket_index(&self, value: f64) -> usize {
        self.boundaries.partition_point(|bound| !(value <= *bound))
    }
}

impl Metric for Histogram {
    const KIND: MetricKind = MetricKind::Histogram;
    type Args = BucketBoundaries;

    fn build(args: BucketBoundaries) -> Result<Self> {
        Histogram::new(args)
    }

    fn collect(&self) -> MetricValue {
        Histogram::collect(self)
    }
}

impl Observe for Histogram {
    fn observe(&self, value: f64) {
        Histogram::observe(self, value);
    }
}

impl Debug for Histogram {
    /// Shows the boundaries and non-zero raw bucket counts.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Histogram{{")?;
        for (i, count) in self.counts.iter().enumerate() {
            let val = count.load(Ordering::Relaxed);
            if val != 0 {
                match self.boundaries.get(i) {
                    Some(bound) => write!(f, " [le {bound}]:{val}")?,
                    None => write!(f, " [le +Inf]:{val}")?,
                }
            }
        }
        write!(f, " sum:{} }}", self.sum.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn snapshot(histogram: &Histogram) -> HistogramValue {
        match histogram.collect() {
            MetricValue::Histogram(value) => value,
            other => panic!("unexpected value {other:?}"),
        }
    }

    fn cumulative(value: &HistogramValue) -> Vec<u64> {
        value.buckets.iter().map(|b| b.cumulative_count).collect()
    }

    #[test]
    fn test_new_allocates_inf_bucket() {
        let histogram = Histogram::new([1.0, 2.0]).unwrap();
        assert_eq!(histogram.bucket_count(), 3);

        let empty = Histogram::new(Vec::<f64>::new()).unwrap();
        assert_eq!(empty.bucket_count(), 1);
    }

    #[test]
    fn test_rejects_unsorted_boundaries() {
        assert_eq!(
            Histogram::new([1.0, 0.5]).unwrap_err(),
            Error::UnsortedBoundaries
        );
        assert_eq!(
            Histogram::new([1.0, 1.0]).unwrap_err(),
            Error::UnsortedBoundaries
        );
        assert_eq!(
            Histogram::new([0.0, f64::NAN]).unwrap_err(),
            Error::UnsortedBoundaries
        );
    }

    #[test]
    fn test_observe_example() {
        let histogram = Histogram::new([0.1, 0.5, 1.0]).unwrap();
        for v in [0.05, 0.1, 0.3, 2.0] {
            histogram.observe(v);
        }

        let value = snapshot(&histogram);
        assert_eq!(cumulative(&value), [2, 3, 3, 4]);
        let bounds: Vec<f64> = value.buckets.iter().map(|b| b.upper_bound).collect();
        assert_eq!(bounds, [0.1, 0.5, 1.0, f64::INFINITY]);
        assert_eq!(value.sample_count, 4);
        assert!((value.sample_sum - 2.45).abs() < 1e-12);
    }

    #[test]
    fn test_value_equal_to_boundary_uses_that_bucket() {
        let histogram = Histogram::new([1.0, 2.0]).unwrap();
        histogram.observe(2.0);

        let value = snapshot(&histogram);
        assert_eq!(cumulative(&value), [0, 1, 1]);
    }

    #[test]
    fn test_value_above_all_boundaries_uses_inf_bucket() {
        let histogram = Histogram::new([1.0]).unwrap();
        histogram.observe(1.5);
        histogram.observe(f64::NAN);

        let value = snapshot(&histogram);
        assert_eq!(cumulative(&value), [0, 2]);
    }

    #[test]
    fn test_observe_multiple() {
        let histogram = Histogram::new([1.0, 2.0]).unwrap();
        histogram.observe_multiple(&[1, 2, 3], 12.5).unwrap();
        histogram.observe(0.5);

        let value = snapshot(&histogram);
        assert_eq!(cumulative(&value), [2, 4, 7]);
        assert_eq!(value.sample_count, 7);
        assert_eq!(value.sample_sum, 13.0);
    }

    #[test]
    fn test_observe_multiple_length_mismatch_leaves_state() {
        let histogram = Histogram::new([1.0, 2.0]).unwrap();
        histogram.observe(1.5);

        let err = histogram.observe_multiple(&[1, 1], 3.0).unwrap_err();
        assert_eq!(
            err,
            Error::BucketCountMismatch {
                expected: 3,
                actual: 2
            }
        );
        assert!(histogram.observe_multiple(&[1, 1, 1, 1], 3.0).is_err());

        let value = snapshot(&histogram);
        assert_eq!(cumulative(&value), [0, 1, 1]);
        assert_eq!(value.sample_sum, 1.5);
    }

    #[test]
    fn test_reset() {
        let histogram = Histogram::new([1.0]).unwrap();
        histogram.observe(0.5);
        histogram.observe(5.0);
        histogram.reset();

        let value = snapshot(&histogram);
        assert_eq!(cumulative(&value), [0, 0]);
        assert_eq!(value.sample_sum, 0.0);
        assert_eq!(value.sample_count, 0);
    }

    #[test]
    fn test_collect_does_not_mutate() {
        let histogram = Histogram::new([1.0]).unwrap();
        histogram.observe(0.5);
        assert_eq!(histogram.collect(), histogram.collect());
    }

    #[test]
    fn test_multiple_threads() {
        let histogram = Arc::new(Histogram::new([10.0, 100.0]).unwrap());
        let mut handles = vec![];

        for t in 0..4 {
            let histogram_clone = Arc::clone(&histogram);
            handles.push(thread::spawn(move || {
                for i in 0..1000 {
                    histogram_clone.observe(((t * 1000 + i) % 200) as f64);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let value = snapshot(&histogram);
        assert_eq!(value.sample_count, 4000);
        // 0..=10 and 11..=100 and 101..=199, 20 times each.
        assert_eq!(cumulative(&value), [11 * 20, 101 * 20, 4000]);
    }

    #[test]
    fn test_observe_multiple_is_atomic_with_collect() {
        let histogram = Arc::new(Histogram::new([1.0, 2.0]).unwrap());
        let writer = {
            let histogram = Arc::clone(&histogram);
            thread::spawn(move || {
                for _ in 0..20_000 {
                    histogram.observe_multiple(&[1, 1, 1], 3.0).unwrap();
                }
            })
        };

        for _ in 0..20_000 {
            let value = snapshot(&histogram);
            let first = value.buckets[0].cumulative_count;
            assert_eq!(value.buckets[2].cumulative_count, 3 * first);
            assert_eq!(value.sample_sum, 3.0 * first as f64);
        }
        writer.join().unwrap();

        let value = snapshot(&histogram);
        assert_eq!(value.sample_count, 60_000);
        assert_eq!(value.sample_sum, 60_000.0);
    }

    #[test]
    fn test_default_boundaries() {
        let histogram = Histogram::build(BucketBoundaries::default()).unwrap();
        assert_eq!(histogram.bucket_count(), BucketBoundaries::DEFAULT.len() + 1);
    }

    #[test]
    fn test_boundary_helpers() {
        assert_eq!(
            BucketBoundaries::linear(0.5, 0.5, 4).as_slice(),
            &[0.5, 1.0, 1.5, 2.0]
        );
        assert_eq!(
            BucketBoundaries::exponential(2.0, 2.0, 3).as_slice(),
            &[2.0, 4.0, 8.0]
        );
        assert!(!BucketBoundaries::linear(0.0, 0.0, 2).is_strictly_increasing());
        assert!(BucketBoundaries::linear(1.0, 1.0, 0).as_slice().is_empty());
    }

    #[test]
    fn test_debug() {
        let histogram = Histogram::new([1.0]).unwrap();
        histogram.observe(0.5);
        histogram.observe(3.0);
        let debug_str = format!("{:?}", histogram);
        assert_eq!(debug_str, "Histogram{ [le 1]:1 [le +Inf]:1 sum:3.5 }");
    }
}
