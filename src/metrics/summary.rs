//! Summary with quantile estimates over a sliding time window.
//!
//! A [`Summary`] keeps a count, a sum and an estimate for each configured
//! quantile. Estimates use the targeted-quantiles variant of the CKMS
//! algorithm: each target `(q, ε)` is answered with a value whose rank is
//! within `ε·n` of `q·n`, while the number of stored samples stays small.
//!
//! # Time Window
//!
//! ```text
//!   max_age = 60s, age_buckets = 5
//!
//!   ┌────────┬────────┬────────┬────────┬────────┐
//!   │ stream │ stream │ stream │ stream │ stream │   every observation goes
//!   │   0    │   1    │   2    │   3    │   4    │   into all five streams
//!   └────────┴───▲────┴────────┴────────┴────────┘
//!                │ current: answers queries, covers up to 60s
//!
//!   every 12s the current stream is cleared and the next one becomes current
//! ```

use std::fmt::Debug;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::metrics::{Metric, MetricKind, Observe};
use crate::snapshot::{MetricValue, QuantileValue, SummaryValue};

/// Observations buffered before they are merged into the sample list.
const BUFFER_SIZE: usize = 500;

/// Configuration of a [`Summary`].
///
/// # Examples
///
/// ```rust
/// use registro::metrics::summary::SummaryConfig;
/// use std::time::Duration;
///
/// let config = SummaryConfig::empty()
///     .with_quantile(0.5, 0.05)
///     .with_quantile(0.99, 0.001)
///     .with_max_age(Duration::from_secs(30))
///     .with_age_buckets(3);
///
/// assert_eq!(config.quantiles(), &[(0.5, 0.05), (0.99, 0.001)]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryConfig {
    quantiles: Vec<(f64, f64)>,
    max_age: Duration,
    age_buckets: usize,
}

impl SummaryConfig {
    /// A configuration with no quantiles, a 60s window and 5 age buckets.
    pub fn empty() -> Self {
        Self {
            quantiles: Vec::new(),
            max_age: Duration::from_secs(60),
            age_buckets: 5,
        }
    }

    /// Adds a target quantile with its allowed rank error.
    pub fn with_quantile(mut self, quantile: f64, error: f64) -> Self {
        self.quantiles.push((quantile, error));
        self
    }

    /// Sets how long an observation contributes to the estimates.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Sets in how many steps the window slides; zero is treated as one.
    pub fn with_age_buckets(mut self, age_buckets: usize) -> Self {
        self.age_buckets = age_buckets;
        self
    }

    /// Returns the configured `(quantile, error)` targets.
    pub fn quantiles(&self) -> &[(f64, f64)] {
        &self.quantiles
    }

    /// Returns the window length.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Returns the number of rotating streams.
    pub fn age_buckets(&self) -> usize {
        self.age_buckets
    }
}

impl Default for SummaryConfig {
    /// Median, 90th and 99th percentile over one minute.
    fn default() -> Self {
        Self::empty()
            .with_quantile(0.5, 0.05)
            .with_quantile(0.9, 0.01)
            .with_quantile(0.99, 0.001)
    }
}

#[derive(Debug, Clone, Copy)]
struct Target {
    quantile: f64,
    error: f64,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    value: f64,
    width: f64,
    delta: f64,
}

/// One CKMS stream answering the targeted quantiles.
#[derive(Debug)]
struct Stream {
    targets: Vec<Target>,
    samples: Vec<Sample>,
    buffer: Vec<f64>,
    n: f64,
}

impl Stream {
    fn new(targets: Vec<Target>) -> Self {
        Self {
            targets,
            samples: Vec::new(),
            buffer: Vec::with_capacity(BUFFER_SIZE),
            n: 0.0,
        }
    }

    fn insert(&mut self, value: f64) {
        self.buffer.push(value);
        if self.buffer.len() == BUFFER_SIZE {
            self.flush();
        }
    }

    fn query(&mut self, quantile: f64) -> f64 {
        self.flush();
        let Some((first, rest)) = self.samples.split_first() else {
            return f64::NAN;
        };

        let mut t = (quantile * self.n).ceil();
        t += (self.invariant(t) / 2.0).ceil();

        let mut prev = first;
        let mut rank = 0.0;
        for current in rest {
            rank += prev.width;
            if rank + current.width + current.delta > t {
                return prev.value;
            }
            prev = current;
        }
        prev.value
    }

    fn reset(&mut self) {
        self.samples.clear();
        self.buffer.clear();
        self.n = 0.0;
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let mut batch = std::mem::take(&mut self.buffer);
        batch.sort_by(f64::total_cmp);
        self.merge(&batch);
        batch.clear();
        self.buffer = batch;
        self.compress();
    }

    /// Allowed `width + delta` for a sample at rank `r`.
    fn invariant(&self, r: f64) -> f64 {
        let mut min = f64::MAX;
        for target in &self.targets {
            let f = if target.quantile * self.n <= r {
                2.0 * target.error * r / target.quantile
            } else {
                2.0 * target.error * (self.n - r) / (1.0 - target.quantile)
            };
            if f < min {
                min = f;
            }
        }
        min
    }

    /// Merges an ascending batch into the sample list.
    fn merge(&mut self, sorted: &[f64]) {
        let mut rank = 0.0;
        let mut i = 0;
        for &value in sorted {
            while i < self.samples.len() && self.samples[i].value <= value {
                rank += self.samples[i].width;
                i += 1;
            }
            let delta = if i == self.samples.len() {
                0.0
            } else {
                (self.invariant(rank).floor() - 1.0).max(0.0)
            };
            self.samples.insert(
                i,
                Sample {
                    value,
                    width: 1.0,
                    delta,
                },
            );
            i += 1;
            self.n += 1.0;
            rank += 1.0;
        }
    }

    /// Folds adjacent samples whose combined error stays within the invariant.
    fn compress(&mut self) {
        if self.samples.len() < 2 {
            return;
        }
        let mut xi = self.samples.len() - 1;
        let mut x = self.samples[xi];
        let mut rank = self.n - 1.0 - x.width;

        for i in (0..self.samples.len() - 1).rev() {
            let c = self.samples[i];
            if c.width + x.width + x.delta <= self.invariant(rank) {
                x.width += c.width;
                self.samples[xi] = x;
                self.samples.remove(i);
                xi -= 1;
            } else {
                x = c;
                xi = i;
            }
            rank -= c.width;
        }
    }
}

/// Rotating set of streams covering the last `max_age`.
#[derive(Debug)]
struct Window {
    streams: Vec<Stream>,
    current: usize,
    last_rotation: Instant,
    rotation_interval: Duration,
}

impl Window {
    fn new(targets: Vec<Target>, max_age: Duration, age_buckets: usize) -> Self {
        let age_buckets = age_buckets.max(1);
        let divisor = u32::try_from(age_buckets).unwrap_or(u32::MAX);
        Self {
            streams: (0..age_buckets)
                .map(|_| Stream::new(targets.clone()))
                .collect(),
            current: 0,
            last_rotation: Instant::now(),
            rotation_interval: max_age / divisor,
        }
    }

    fn insert(&mut self, value: f64) {
        self.rotate();
        for stream in &mut self.streams {
            stream.insert(value);
        }
    }

    fn query(&mut self, quantile: f64) -> f64 {
        self.rotate();
        self.streams[self.current].query(quantile)
    }

    fn rotate(&mut self) {
        if self.rotation_interval.is_zero() {
            return;
        }
        let elapsed = self.last_rotation.elapsed();
        if elapsed <= self.rotation_interval {
            return;
        }

        let interval = self.rotation_interval.as_nanos();
        let steps = elapsed.as_nanos() / interval;
        if steps >= self.streams.len() as u128 {
            self.streams.iter_mut().for_each(Stream::reset);
        } else {
            for _ in 0..steps {
                self.streams[self.current].reset();
                self.current = (self.current + 1) % self.streams.len();
            }
        }

        let advanced = interval * steps;
        self.last_rotation += Duration::from_nanos(u64::try_from(advanced).unwrap_or(u64::MAX));
    }
}

#[derive(Debug)]
struct SummaryState {
    window: Window,
    count: u64,
    sum: f64,
}

/// A summary metric reporting a count, a sum and windowed quantile estimates.
///
/// # Examples
///
/// ```rust
/// use registro::metrics::summary::{Summary, SummaryConfig};
/// use registro::snapshot::MetricValue;
///
/// let summary = Summary::new(SummaryConfig::empty().with_quantile(0.5, 0.05))?;
/// for v in 1..=100 {
///     summary.observe(v as f64);
/// }
///
/// let MetricValue::Summary(snapshot) = summary.collect() else { unreachable!() };
/// assert_eq!(snapshot.sample_count, 100);
/// assert_eq!(snapshot.sample_sum, 5050.0);
/// assert!((snapshot.quantiles[0].value - 50.0).abs() <= 10.0);
/// # Ok::<(), registro::Error>(())
/// ```
pub struct Summary {
    quantiles: Vec<f64>,
    state: Mutex<SummaryState>,
}

impl Summary {
    /// Creates a summary from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuantile`] if a quantile or its error is outside
    /// `[0, 1]`.
    pub fn new(config: SummaryConfig) -> Result<Self> {
        let unit = 0.0..=1.0;
        let mut targets = Vec::with_capacity(config.quantiles.len());
        for &(quantile, error) in &config.quantiles {
            if !unit.contains(&quantile) || !unit.contains(&error) {
                return Err(Error::InvalidQuantile { quantile, error });
            }
            targets.push(Target { quantile, error });
        }

        Ok(Summary {
            quantiles: targets.iter().map(|t| t.quantile).collect(),
            state: Mutex::new(SummaryState {
                window: Window::new(targets, config.max_age, config.age_buckets),
                count: 0,
                sum: 0.0,
            }),
        })
    }

    /// Records one observation.
    ///
    /// NaN is ignored: it is not counted and affects neither the sum nor the quantiles.
    pub fn observe(&self, value: f64) {
        if value.is_nan() {
            return;
        }
        let mut state = self.state.lock();
        state.count += 1;
        state.sum += value;
        state.window.insert(value);
    }

    /// Returns the count, the sum and the current quantile estimates.
    pub fn collect(&self) -> MetricValue {
        let mut state = self.state.lock();
        let quantiles = self
            .quantiles
            .iter()
            .map(|&quantile| QuantileValue {
                quantile,
                value: state.window.query(quantile),
            })
            .collect();

        MetricValue::Summary(SummaryValue {
            sample_count: state.count,
            sample_sum: state.sum,
            quantiles,
        })
    }
}

impl Metric for Summary {
    const KIND: MetricKind = MetricKind::Summary;
    type Args = SummaryConfig;

    fn build(args: SummaryConfig) -> Result<Self> {
        Summary::new(args)
    }

    fn collect(&self) -> MetricValue {
        Summary::collect(self)
    }
}

impl Observe for Summary {
    fn observe(&self, value: f64) {
        Summary::observe(self, value);
    }
}

impl Debug for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Summary")
            .field("quantiles", &self.quantiles)
            .field("count", &state.count)
            .field("sum", &state.sum)
            .finish()
    }
}
