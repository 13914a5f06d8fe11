//! Fluent family registration.
//!
//! A thin convenience over [`Registry::add_family`]: collect the name, help
//! text and constant labels with chained setters, then register.
//!
//! ```rust
//! use registro::builder::build_counter;
//! use registro::{Labels, Registry};
//!
//! let registry = Registry::default();
//! let requests = build_counter()
//!     .name("http_requests_total")
//!     .help("Requests served.")
//!     .label("service", "api")
//!     .register(&registry)?;
//!
//! requests.get_or_add(&Labels::from([("method", "GET")]))?.increment();
//! # Ok::<(), registro::Error>(())
//! ```

use std::fmt::{self, Debug};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::Result;
use crate::family::Family;
use crate::labels::Labels;
use crate::metrics::counter::Counter;
use crate::metrics::gauge::Gauge;
use crate::metrics::histogram::Histogram;
use crate::metrics::info::Info;
use crate::metrics::summary::Summary;
use crate::metrics::Metric;
use crate::registry::Registry;

/// Collects the parameters of a family of type `T` before registration.
pub struct Builder<T> {
    name: String,
    help: String,
    labels: Labels,
    _metric: PhantomData<fn() -> T>,
}

impl<T: Metric> Builder<T> {
    /// Creates a builder with an empty name, help text and label set.
    pub fn new() -> Self {
        Self {
            name: String::new(),
            help: String::new(),
            labels: Labels::new(),
            _metric: PhantomData,
        }
    }

    /// Sets the family name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the help text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Replaces the constant labels.
    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Adds one constant label.
    pub fn label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(name, value);
        self
    }

    /// Registers the family, with the same semantics as [`Registry::add_family`].
    pub fn register(self, registry: &Registry) -> Result<Arc<Family<T>>> {
        registry.add_family::<T>(&self.name, &self.help, self.labels)
    }
}

impl<T: Metric> Default for Builder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Metric> Debug for Builder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("kind", &T::KIND)
            .field("name", &self.name)
            .field("help", &self.help)
            .field("labels", &self.labels)
            .finish()
    }
}

/// Starts building a counter family.
pub fn build_counter() -> Builder<Counter> {
    Builder::new()
}

/// Starts building a gauge family.
pub fn build_gauge() -> Builder<Gauge> {
    Builder::new()
}

/// Starts building a histogram family.
pub fn build_histogram() -> Builder<Histogram> {
    Builder::new()
}

/// Starts building a summary family.
pub fn build_summary() -> Builder<Summary> {
    Builder::new()
}

/// Starts building an info family.
pub fn build_info() -> Builder<Info> {
    Builder::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::metrics::MetricKind;
    use crate::registry::InsertBehavior;

    #[test]
    fn test_register() {
        let registry = Registry::default();
        let family = build_gauge()
            .name("temperature")
            .help("Room temperature.")
            .labels(Labels::from([("building", "a")]))
            .label("floor", "2")
            .register(&registry)
            .unwrap();

        assert_eq!(family.name(), "temperature");
        assert_eq!(family.help(), "Room temperature.");
        assert_eq!(
            family.constant_labels(),
            &Labels::from([("building", "a"), ("floor", "2")])
        );
        assert!(Arc::ptr_eq(
            &family,
            &registry.family::<Gauge>("temperature").unwrap()
        ));
    }

    #[test]
    fn test_register_follows_insert_behavior() {
        let registry = Registry::new(InsertBehavior::Throw);
        build_summary().name("s").register(&registry).unwrap();
        assert_eq!(
            build_summary().name("s").register(&registry).unwrap_err(),
            Error::DuplicateFamily("s".to_string())
        );

        let err = build_histogram().name("s").register(&registry).unwrap_err();
        assert!(matches!(
            err,
            Error::NameConflict {
                existing: MetricKind::Summary,
                requested: MetricKind::Histogram,
                ..
            }
        ));
    }

    #[test]
    fn test_register_without_name_fails() {
        let registry = Registry::default();
        let err = build_info().register(&registry).unwrap_err();
        assert_eq!(err, Error::InvalidMetricName(String::new()));
    }

    #[test]
    fn test_debug() {
        let builder = build_counter().name("c").label("a", "1");
        let debug_str = format!("{:?}", builder);
        assert!(debug_str.contains("Counter"));
        assert!(debug_str.contains("\"c\""));
    }
}
