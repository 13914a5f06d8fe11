//! Families: named groups of same-type metrics keyed by label set.
//!
//! A [`Family`] owns one metric instance per distinct [`Labels`] value. All
//! instances share the family's name, help text and constant labels.
//!
//! # Ownership
//!
//! Metrics are handed out as `Arc<T>`. Removing a label set from the family
//! only drops the family's reference: a handle obtained earlier keeps working,
//! it is just no longer collected.
//!
//! ```rust
//! use registro::metrics::counter::Counter;
//! use registro::naming::PrometheusNames;
//! use registro::{Family, Labels};
//! use std::sync::Arc;
//!
//! let family = Family::<Counter>::new(
//!     "http_requests_total",
//!     "Requests served.",
//!     Labels::from([("env", "prod")]),
//!     Arc::new(PrometheusNames),
//! )?;
//!
//! let get = Labels::from([("method", "GET")]);
//! let counter = family.get_or_add(&get)?;
//! counter.increment();
//!
//! // Same label set, same instance.
//! assert!(Arc::ptr_eq(&counter, &family.get_or_add(&get)?));
//!
//! family.remove(&get);
//! counter.increment(); // still usable
//! assert!(family.get(&get).is_none());
//! # Ok::<(), registro::Error>(())
//! ```

use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::collectable::Collectable;
use crate::error::{Error, Result};
use crate::labels::Labels;
use crate::metrics::Metric;
use crate::naming::NameValidator;
use crate::snapshot::{ClientMetric, LabelPair, MetricFamily};

/// A named group of metrics of type `T`, one per label set.
pub struct Family<T> {
    name: String,
    help: String,
    constant_labels: Labels,
    validator: Arc<dyn NameValidator>,
    metrics: RwLock<BTreeMap<Labels, Arc<T>>>,
}

impl<T: Metric> Family<T> {
    /// Creates an empty family.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMetricName`] or [`Error::InvalidLabelName`] if
    /// the validator rejects the name or one of the constant label names.
    pub fn new(
        name: impl Into<String>,
        help: impl Into<String>,
        constant_labels: Labels,
        validator: Arc<dyn NameValidator>,
    ) -> Result<Self> {
        let name = name.into();
        if !validator.is_valid_metric_name(&name) {
            return Err(Error::InvalidMetricName(name));
        }
        for label in constant_labels.names() {
            if !validator.is_valid_label_name(label, T::KIND) {
                return Err(Error::InvalidLabelName {
                    label: label.to_string(),
                    kind: T::KIND,
                });
            }
        }

        Ok(Family {
            name,
            help: help.into(),
            constant_labels,
            validator,
            metrics: RwLock::new(BTreeMap::new()),
        })
    }

    /// Returns the metric for `labels`, creating it with default arguments on first use.
    pub fn get_or_add(&self, labels: &Labels) -> Result<Arc<T>> {
        self.get_or_add_with(labels, T::Args::default())
    }

    /// Returns the metric for `labels`, creating it from `args` on first use.
    ///
    /// Concurrent callers racing on the same label set all receive the same
    /// instance. `args` is ignored when the metric already exists.
    ///
    /// # Errors
    ///
    /// Fails if a label name is invalid, repeats a constant label, or if the
    /// metric cannot be built from `args`. Nothing is inserted on failure.
    pub fn get_or_add_with(&self, labels: &Labels, args: T::Args) -> Result<Arc<T>> {
        if let Some(metric) = self.get(labels) {
            return Ok(metric);
        }

        let mut metrics = self.metrics.write();
        if let Some(metric) = metrics.get(labels) {
            return Ok(Arc::clone(metric));
        }

        self.check_labels(labels)?;
        let metric = Arc::new(T::build(args)?);
        metrics.insert(labels.clone(), Arc::clone(&metric));
        tracing::trace!(family = %self.name, labels = %labels, "created metric");
        Ok(metric)
    }

    /// Returns the metric for `labels` if it exists.
    pub fn get(&self, labels: &Labels) -> Option<Arc<T>> {
        self.metrics.read().get(labels).cloned()
    }

    /// Removes the metric for `labels`.
    ///
    /// Returns `true` if a metric was removed. Handles obtained earlier stay
    /// valid.
    pub fn remove(&self, labels: &Labels) -> bool {
        let removed = self.metrics.write().remove(labels).is_some();
        if removed {
            tracing::trace!(family = %self.name, labels = %labels, "removed metric");
        }
        removed
    }

    /// Returns a snapshot of every metric in the family.
    ///
    /// A family without metrics yields an empty vector, otherwise exactly one
    /// [`MetricFamily`]. When `clear` is set the family is emptied in the same
    /// critical section, so no metric added concurrently is lost unseen.
    pub fn collect(&self, clear: bool) -> Vec<MetricFamily> {
        let metrics = if clear {
            let mut guard = self.metrics.write();
            std::mem::take(&mut *guard)
                .into_iter()
                .map(|(labels, metric)| self.collect_metric(&labels, &metric))
                .collect::<Vec<_>>()
        } else {
            self.metrics
                .read()
                .iter()
                .map(|(labels, metric)| self.collect_metric(labels, metric))
                .collect()
        };

        if metrics.is_empty() {
            return Vec::new();
        }

        vec![MetricFamily {
            name: self.name.clone(),
            help: self.help.clone(),
            kind: T::KIND,
            metrics,
        }]
    }

    fn collect_metric(&self, labels: &Labels, metric: &T) -> ClientMetric {
        let labels = self
            .constant_labels
            .iter()
            .chain(labels.iter())
            .map(|(name, value)| LabelPair::new(name, value))
            .collect();
        ClientMetric {
            labels,
            value: metric.collect(),
        }
    }

    fn check_labels(&self, labels: &Labels) -> Result<()> {
        for label in labels.names() {
            if !self.validator.is_valid_label_name(label, T::KIND) {
                return Err(Error::InvalidLabelName {
                    label: label.to_string(),
                    kind: T::KIND,
                });
            }
            if self.constant_labels.contains(label) {
                return Err(Error::DuplicateLabel(label.to_string()));
            }
        }
        Ok(())
    }
}

impl<T> Family<T> {
    /// Returns the family name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the help text.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Returns the labels attached to every sample of the family.
    pub fn constant_labels(&self) -> &Labels {
        &self.constant_labels
    }

    /// Returns the number of metrics in the family.
    pub fn len(&self) -> usize {
        self.metrics.read().len()
    }

    /// Returns `true` if the family holds no metrics.
    pub fn is_empty(&self) -> bool {
        self.metrics.read().is_empty()
    }
}

impl<T: Metric> Collectable for Family<T> {
    fn collect(&self, clear: bool) -> Vec<MetricFamily> {
        Family::collect(self, clear)
    }
}

impl<T: Metric> Debug for Family<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Family")
            .field("name", &self.name)
            .field("kind", &T::KIND)
            .field("constant_labels", &self.constant_labels)
            .field("metrics", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::counter::Counter;
    use crate::metrics::gauge::Gauge;
    use crate::metrics::histogram::{BucketBoundaries, Histogram};
    use crate::metrics::MetricKind;
    use crate::naming::PrometheusNames;
    use crate::snapshot::MetricValue;
    use std::sync::Barrier;
    use std::thread;

    fn family<T: Metric>(constant_labels: Labels) -> Family<T> {
        Family::new("test_metric", "A test metric.", constant_labels, Arc::new(PrometheusNames))
            .unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_name() {
        let err = Family::<Counter>::new("bad-name", "", Labels::new(), Arc::new(PrometheusNames))
            .unwrap_err();
        assert_eq!(err, Error::InvalidMetricName("bad-name".to_string()));
    }

    #[test]
    fn test_new_rejects_invalid_constant_label() {
        let err = Family::<Histogram>::new(
            "latency",
            "",
            Labels::from([("le", "1")]),
            Arc::new(PrometheusNames),
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidLabelName {
                label: "le".to_string(),
                kind: MetricKind::Histogram
            }
        );
    }

    #[test]
    fn test_get_or_add_returns_same_instance() {
        let family = family::<Counter>(Labels::new());
        let labels = Labels::from([("a", "1")]);
        let first = family.get_or_add(&labels).unwrap();
        let second = family.get_or_add(&labels).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(family.len(), 1);

        let other = family.get_or_add(&Labels::from([("a", "2")])).unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(family.len(), 2);
    }

    #[test]
    fn test_get_is_pure_lookup() {
        let family = family::<Gauge>(Labels::new());
        let labels = Labels::from([("a", "1")]);
        assert!(family.get(&labels).is_none());
        assert!(family.is_empty());

        family.get_or_add(&labels).unwrap().set(2.0);
        assert_eq!(family.get(&labels).unwrap().value(), 2.0);
    }

    #[test]
    fn test_remove_keeps_prior_handles_valid() {
        let family = family::<Counter>(Labels::new());
        let labels = Labels::from([("a", "1")]);
        let handle = family.get_or_add(&labels).unwrap();
        handle.increment();

        assert!(family.remove(&labels));
        assert!(!family.remove(&labels));
        assert!(family.get(&labels).is_none());

        handle.increment();
        assert_eq!(handle.value(), 2.0);

        // A new instance starts from scratch.
        let fresh = family.get_or_add(&labels).unwrap();
        assert_eq!(fresh.value(), 0.0);
        assert!(!Arc::ptr_eq(&handle, &fresh));
    }

    #[test]
    fn test_rejects_invalid_instance_label() {
        let family = family::<Histogram>(Labels::new());
        let err = family
            .get_or_add(&Labels::from([("le", "0.5")]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidLabelName { .. }));
        assert!(family.is_empty());
    }

    #[test]
    fn test_rejects_label_shadowing_constant_label() {
        let family = family::<Counter>(Labels::from([("env", "prod")]));
        let err = family
            .get_or_add(&Labels::from([("env", "dev")]))
            .unwrap_err();
        assert_eq!(err, Error::DuplicateLabel("env".to_string()));
        assert!(family.is_empty());
    }

    #[test]
    fn test_build_failure_inserts_nothing() {
        let family = family::<Histogram>(Labels::new());
        let err = family
            .get_or_add_with(&Labels::new(), BucketBoundaries::from([2.0, 1.0]))
            .unwrap_err();
        assert_eq!(err, Error::UnsortedBoundaries);
        assert!(family.is_empty());
    }

    #[test]
    fn test_collect_empty_family() {
        let family = family::<Counter>(Labels::new());
        assert!(family.collect(false).is_empty());
        assert!(family.collect(true).is_empty());
    }

    #[test]
    fn test_collect_clear() {
        let family = family::<Counter>(Labels::new());
        family
            .get_or_add(&Labels::from([("a", "1")]))
            .unwrap()
            .increment();

        let collected = family.collect(true);
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].metrics.len(), 1);
        assert_eq!(collected[0].metrics[0].value, MetricValue::Counter(1.0));

        assert!(family.is_empty());
        assert!(family.collect(false).is_empty());
    }

    #[test]
    fn test_collect_without_clear_keeps_metrics() {
        let family = family::<Counter>(Labels::new());
        family.get_or_add(&Labels::new()).unwrap().increment();
        assert_eq!(family.collect(false), family.collect(false));
        assert_eq!(family.len(), 1);
    }

    #[test]
    fn test_collect_label_order() {
        let family = family::<Gauge>(Labels::from([("env", "prod")]));
        family
            .get_or_add(&Labels::from([("route", "/a")]))
            .unwrap()
            .set(1.0);

        let collected = family.collect(false);
        assert_eq!(collected[0].name, "test_metric");
        assert_eq!(collected[0].help, "A test metric.");
        assert_eq!(collected[0].kind, MetricKind::Gauge);
        assert_eq!(
            collected[0].metrics[0].labels,
            [LabelPair::new("env", "prod"), LabelPair::new("route", "/a")]
        );
    }

    #[test]
    fn test_constant_labels_come_first() {
        let family = family::<Gauge>(Labels::from([("zone", "eu")]));
        family
            .get_or_add(&Labels::from([("app", "web"), ("host", "h1")]))
            .unwrap();

        let collected = family.collect(false);
        let names: Vec<&str> = collected[0].metrics[0]
            .labels
            .iter()
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(names, ["zone", "app", "host"]);
    }

    #[test]
    fn test_concurrent_get_or_add_creates_one_metric() {
        let family = Arc::new(family::<Counter>(Labels::new()));
        let barrier = Arc::new(Barrier::new(8));
        let mut handles = vec![];

        for _ in 0..8 {
            let family = Arc::clone(&family);
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                let counter = family.get_or_add(&Labels::from([("a", "1")])).unwrap();
                counter.increment();
                counter
            }));
        }

        let counters: Vec<Arc<Counter>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(counters.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(family.len(), 1);
        assert_eq!(counters[0].value(), 8.0);
    }
}
