//! Unified error type for registration, construction and usage failures.
//!
//! Every fallible operation in the crate returns [`Result`], so callers handle
//! construction errors (bad names, unsorted bucket boundaries), conflict errors
//! (a name reused across metric types) and usage errors (observing a family that
//! was never registered) through one type.
//!
//! # Example
//!
//! ```rust
//! use registro::metrics::counter::Counter;
//! use registro::{Error, Labels, Registry};
//!
//! let registry = Registry::default();
//! let err = registry
//!     .get_or_add_metric::<Counter>("never_registered", &Labels::new(), ())
//!     .unwrap_err();
//! assert!(matches!(err, Error::FamilyNotRegistered { .. }));
//! ```

use thiserror::Error;

use crate::metrics::MetricKind;

/// Error type for all registry, family and metric operations.
///
/// None of these conditions is transient: they indicate a programming error in
/// the instrumented application and are never retried internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The metric name was rejected by the naming validator.
    #[error("invalid metric name: {0:?}")]
    InvalidMetricName(String),

    /// A constant or instance label name was rejected by the naming validator.
    #[error("invalid label name {label:?} for {kind} metric")]
    InvalidLabelName {
        /// The offending label name.
        label: String,
        /// The metric type the label was checked against.
        kind: MetricKind,
    },

    /// An instance label repeats the name of one of the family's constant labels.
    #[error("label {0:?} is already a constant label of the family")]
    DuplicateLabel(String),

    /// Histogram bucket boundaries are not strictly increasing.
    #[error("bucket boundaries must be strictly increasing")]
    UnsortedBoundaries,

    /// The number of bulk bucket increments differs from the number of buckets.
    #[error("expected {expected} bucket increments, got {actual}")]
    BucketCountMismatch {
        /// Number of buckets in the histogram, including +Inf.
        expected: usize,
        /// Number of increments supplied.
        actual: usize,
    },

    /// A summary quantile or its allowed error is outside `[0, 1]`.
    #[error("invalid quantile {quantile} with error {error}")]
    InvalidQuantile {
        /// The requested quantile.
        quantile: f64,
        /// The requested rank error.
        error: f64,
    },

    /// The family name is already registered for another metric type.
    #[error("family {name:?} is already registered as a {existing}, cannot register it as a {requested}")]
    NameConflict {
        /// The conflicting name.
        name: String,
        /// The type the name is registered with.
        existing: MetricKind,
        /// The type the caller asked for.
        requested: MetricKind,
    },

    /// The family already exists and the registry rejects duplicates.
    #[error("family {0:?} is already registered")]
    DuplicateFamily(String),

    /// A metric was requested from a family that was never registered.
    #[error("{kind} family {name:?} not registered before use")]
    FamilyNotRegistered {
        /// The requested family name.
        name: String,
        /// The requested metric type.
        kind: MetricKind,
    },
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, Error>;
