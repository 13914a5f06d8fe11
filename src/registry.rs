//! The registry: owner of every family, one map per metric type.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────── Registry ────────────────┐
//!                 │  RwLock<FamilyMaps>                      │
//!                 │    counters:   name ─► Arc<Family<Counter>>
//!   add_family ──►│    gauges:     name ─► Arc<Family<Gauge>>
//!                 │    histograms: name ─► Arc<Family<Histogram>>
//!                 │    summaries:  name ─► Arc<Family<Summary>>
//!                 │    infos:      name ─► Arc<Family<Info>>
//!                 └───────────────┬──────────────────────────┘
//!                                 │ get_or_add_metric (lock released)
//!                                 ▼
//!                    Family: RwLock<Labels ─► Arc<T>>
//! ```
//!
//! # Locking
//!
//! Registration is double-checked: a shared lock serves the common case where
//! the family already exists, and only a miss takes the exclusive lock, checks
//! again and inserts. Concurrent registrations of the same `(type, name)`
//! therefore converge on a single family. A name is bound to one metric type
//! for the whole registry; registering it under another type fails with
//! [`Error::NameConflict`].
//!
//! [`collect`](Registry::collect) holds the exclusive lock for its whole
//! duration, so a scrape never observes a half-registered family. The registry
//! lock is always released before a family's own lock is taken on the metric
//! path, and taken before it on the collect path, so the two never invert.
//!
//! # Collection Order
//!
//! Families are collected by type (counters, gauges, histograms, summaries,
//! infos) and, within a type, in ascending name order.

use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::collectable::Collectable;
use crate::error::{Error, Result};
use crate::family::Family;
use crate::labels::Labels;
use crate::metrics::{Decrement, Increment, Metric, Observe, Set};
use crate::naming::{NameValidator, PrometheusNames};
use crate::snapshot::MetricFamily;

/// How to handle a second registration of an existing `(type, name)` pair.
///
/// Registering a name under a different type is always an error.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InsertBehavior {
    /// Return the existing family; its help text and constant labels are kept.
    #[default]
    Merge,
    /// Fail with [`Error::DuplicateFamily`].
    Throw,
}

pub(crate) mod sealed {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use crate::family::Family;
    use crate::metrics::counter::Counter;
    use crate::metrics::gauge::Gauge;
    use crate::metrics::histogram::Histogram;
    use crate::metrics::info::Info;
    use crate::metrics::summary::Summary;
    use crate::metrics::{Metric, MetricKind};
    use crate::snapshot::MetricFamily;

    pub type FamilyMap<T> = BTreeMap<String, Arc<Family<T>>>;

    /// The per-type family maps guarded by the registry lock.
    #[derive(Default)]
    pub struct FamilyMaps {
        pub(crate) counters: FamilyMap<Counter>,
        pub(crate) gauges: FamilyMap<Gauge>,
        pub(crate) histograms: FamilyMap<Histogram>,
        pub(crate) summaries: FamilyMap<Summary>,
        pub(crate) infos: FamilyMap<Info>,
    }

    impl FamilyMaps {
        /// The type a name is registered with, if any.
        pub(crate) fn kind_of(&self, name: &str) -> Option<MetricKind> {
            if self.counters.contains_key(name) {
                Some(MetricKind::Counter)
            } else if self.gauges.contains_key(name) {
                Some(MetricKind::Gauge)
            } else if self.histograms.contains_key(name) {
                Some(MetricKind::Histogram)
            } else if self.summaries.contains_key(name) {
                Some(MetricKind::Summary)
            } else if self.infos.contains_key(name) {
                Some(MetricKind::Info)
            } else {
                None
            }
        }

        pub(crate) fn len(&self) -> usize {
            self.counters.len()
                + self.gauges.len()
                + self.histograms.len()
                + self.summaries.len()
                + self.infos.len()
        }

        pub(crate) fn collect(&self, clear: bool) -> Vec<MetricFamily> {
            let mut results = Vec::new();
            collect_all(&mut results, &self.counters, clear);
            collect_all(&mut results, &self.gauges, clear);
            collect_all(&mut results, &self.histograms, clear);
            collect_all(&mut results, &self.summaries, clear);
            collect_all(&mut results, &self.infos, clear);
            results
        }
    }

    fn collect_all<T: Metric>(results: &mut Vec<MetricFamily>, families: &FamilyMap<T>, clear: bool) {
        for family in families.values() {
            results.extend(family.collect(clear));
        }
    }

    /// Selects the registry map that holds families of `Self`.
    pub trait Registrable: Sized {
        fn families(maps: &FamilyMaps) -> &FamilyMap<Self>;
        fn families_mut(maps: &mut FamilyMaps) -> &mut FamilyMap<Self>;
    }

    macro_rules! registrable {
        ($metric:ty, $field:ident) => {
            impl Registrable for $metric {
                fn families(maps: &FamilyMaps) -> &FamilyMap<Self> {
                    &maps.$field
                }

                fn families_mut(maps: &mut FamilyMaps) -> &mut FamilyMap<Self> {
                    &mut maps.$field
                }
            }
        };
    }

    registrable!(Counter, counters);
    registrable!(Gauge, gauges);
    registrable!(Histogram, histograms);
    registrable!(Summary, summaries);
    registrable!(Info, infos);
}

use sealed::FamilyMaps;

/// A thread-safe collection of metric families.
///
/// # Examples
///
/// ```rust
/// use registro::metrics::histogram::{BucketBoundaries, Histogram};
/// use registro::{InsertBehavior, Labels, Registry};
///
/// let registry = Registry::new(InsertBehavior::Merge);
/// let latency = registry.add_family::<Histogram>(
///     "request_duration_seconds",
///     "Request latency.",
///     Labels::from([("service", "api")]),
/// )?;
///
/// let route = Labels::from([("route", "/users")]);
/// let histogram = latency.get_or_add_with(&route, BucketBoundaries::from([0.1, 0.5, 1.0]))?;
/// histogram.observe(0.3);
///
/// let families = registry.collect(false);
/// assert_eq!(families.len(), 1);
/// assert_eq!(families[0].metrics[0].label("service"), Some("api"));
/// # Ok::<(), registro::Error>(())
/// ```
pub struct Registry {
    insert_behavior: InsertBehavior,
    validator: Arc<dyn NameValidator>,
    families: RwLock<FamilyMaps>,
}

impl Registry {
    /// Creates an empty registry validating names with [`PrometheusNames`].
    pub fn new(insert_behavior: InsertBehavior) -> Self {
        Self {
            insert_behavior,
            validator: Arc::new(PrometheusNames),
            families: RwLock::new(FamilyMaps::default()),
        }
    }

    /// Uses `validator` for every family this registry creates.
    pub fn with_validator(mut self, validator: Arc<dyn NameValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Returns the duplicate-registration policy.
    pub fn insert_behavior(&self) -> InsertBehavior {
        self.insert_behavior
    }

    /// Registers a family of type `T`, or returns the existing one.
    ///
    /// Under [`InsertBehavior::Merge`] a second registration returns the
    /// family created first, whose help text and constant labels are kept.
    ///
    /// # Errors
    ///
    /// - [`Error::NameConflict`] if `name` is registered with another type
    /// - [`Error::DuplicateFamily`] under [`InsertBehavior::Throw`] if `name`
    ///   is already registered with type `T`
    /// - [`Error::InvalidMetricName`] / [`Error::InvalidLabelName`] if the
    ///   validator rejects the name or a constant label
    pub fn add_family<T: Metric>(
        &self,
        name: &str,
        help: &str,
        constant_labels: Labels,
    ) -> Result<Arc<Family<T>>> {
        {
            let families = self.families.read();
            if let Some(family) = T::families(&families).get(name) {
                return self.existing(family);
            }
        }

        let mut families = self.families.write();
        if let Some(family) = T::families(&families).get(name) {
            return self.existing(family);
        }
        if let Some(existing) = families.kind_of(name) {
            tracing::debug!(name, %existing, requested = %T::KIND, "family name conflict");
            return Err(Error::NameConflict {
                name: name.to_string(),
                existing,
                requested: T::KIND,
            });
        }

        let family = Arc::new(Family::new(
            name,
            help,
            constant_labels,
            Arc::clone(&self.validator),
        )?);
        T::families_mut(&mut families).insert(name.to_string(), Arc::clone(&family));
        tracing::debug!(name, kind = %T::KIND, "registered family");
        Ok(family)
    }

    /// Returns the family of type `T` registered under `name`.
    pub fn family<T: Metric>(&self, name: &str) -> Option<Arc<Family<T>>> {
        T::families(&self.families.read()).get(name).cloned()
    }

    /// Returns the metric for `labels` in the family `name`, creating it from
    /// `args` on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FamilyNotRegistered`] if no family of type `T` is
    /// registered under `name`, or any error of
    /// [`Family::get_or_add_with`].
    pub fn get_or_add_metric<T: Metric>(
        &self,
        name: &str,
        labels: &Labels,
        args: T::Args,
    ) -> Result<Arc<T>> {
        let family = self
            .family::<T>(name)
            .ok_or_else(|| Error::FamilyNotRegistered {
                name: name.to_string(),
                kind: T::KIND,
            })?;
        family.get_or_add_with(labels, args)
    }

    /// Removes the metric for `labels` from the family `name`.
    ///
    /// Returns `true` if the family exists, whether or not it held a metric
    /// for `labels`. Use [`Family::remove`] to learn if a metric was removed.
    pub fn remove<T: Metric>(&self, name: &str, labels: &Labels) -> bool {
        match self.family::<T>(name) {
            Some(family) => {
                family.remove(labels);
                true
            }
            None => false,
        }
    }

    /// Unregisters the family `name` of type `T`.
    ///
    /// Returns `true` if the family existed. Handles to the family and its
    /// metrics stay usable but are no longer collected; the name becomes free
    /// for any type.
    pub fn remove_family<T: Metric>(&self, name: &str) -> bool {
        let removed = T::families_mut(&mut self.families.write())
            .remove(name)
            .is_some();
        if removed {
            tracing::debug!(name, kind = %T::KIND, "removed family");
        }
        removed
    }

    /// Increments the metric for `labels` in the family `name`.
    pub fn inc<T: Metric + Increment>(
        &self,
        name: &str,
        labels: &Labels,
        value: f64,
        args: T::Args,
    ) -> Result<()> {
        self.get_or_add_metric::<T>(name, labels, args)?
            .increment_by(value);
        Ok(())
    }

    /// Decrements the metric for `labels` in the family `name`.
    pub fn dec<T: Metric + Decrement>(
        &self,
        name: &str,
        labels: &Labels,
        value: f64,
        args: T::Args,
    ) -> Result<()> {
        self.get_or_add_metric::<T>(name, labels, args)?
            .decrement_by(value);
        Ok(())
    }

    /// Sets the metric for `labels` in the family `name`.
    pub fn set<T: Metric + Set>(
        &self,
        name: &str,
        labels: &Labels,
        value: f64,
        args: T::Args,
    ) -> Result<()> {
        self.get_or_add_metric::<T>(name, labels, args)?.set(value);
        Ok(())
    }

    /// Records an observation on the metric for `labels` in the family `name`.
    pub fn observe<T: Metric + Observe>(
        &self,
        name: &str,
        labels: &Labels,
        value: f64,
        args: T::Args,
    ) -> Result<()> {
        self.get_or_add_metric::<T>(name, labels, args)?
            .observe(value);
        Ok(())
    }

    /// Returns a snapshot of every non-empty family.
    ///
    /// Holds the exclusive lock for the whole collection. With `clear` set,
    /// every family is emptied after it is collected; the families themselves
    /// stay registered.
    pub fn collect(&self, clear: bool) -> Vec<MetricFamily> {
        self.families.write().collect(clear)
    }

    /// Returns the number of registered families across all types.
    pub fn len(&self) -> usize {
        self.families.read().len()
    }

    /// Returns `true` if no family is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn existing<T: Metric>(&self, family: &Arc<Family<T>>) -> Result<Arc<Family<T>>> {
        match self.insert_behavior {
            InsertBehavior::Merge => Ok(Arc::clone(family)),
            InsertBehavior::Throw => {
                tracing::debug!(name = family.name(), kind = %T::KIND, "duplicate family rejected");
                Err(Error::DuplicateFamily(family.name().to_string()))
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(InsertBehavior::default())
    }
}

impl Collectable for Registry {
    fn collect(&self, clear: bool) -> Vec<MetricFamily> {
        Registry::collect(self, clear)
    }
}

impl Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let families = self.families.read();
        let names: BTreeMap<&str, _> = [
            families.counters.keys().map(|k| (k.as_str(), "counter")).collect::<Vec<_>>(),
            families.gauges.keys().map(|k| (k.as_str(), "gauge")).collect(),
            families.histograms.keys().map(|k| (k.as_str(), "histogram")).collect(),
            families.summaries.keys().map(|k| (k.as_str(), "summary")).collect(),
            families.infos.keys().map(|k| (k.as_str(), "info")).collect(),
        ]
        .into_iter()
        .flatten()
        .collect();
        f.debug_struct("Registry")
            .field("insert_behavior", &self.insert_behavior)
            .field("families", &names)
            .finish()
    }
}
