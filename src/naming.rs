//! Metric and label name validation.
//!
//! Families consult a [`NameValidator`] when they are constructed and when a
//! new label set is added. The registry uses [`PrometheusNames`] unless another
//! validator is supplied through
//! [`Registry::with_validator`](crate::Registry::with_validator).

use crate::metrics::MetricKind;

/// Predicate deciding which metric and label names are acceptable.
pub trait NameValidator: Send + Sync {
    /// Returns `true` if `name` may be used as a family name.
    fn is_valid_metric_name(&self, name: &str) -> bool;

    /// Returns `true` if `name` may be used as a label on a metric of `kind`.
    fn is_valid_label_name(&self, name: &str, kind: MetricKind) -> bool;
}

/// The Prometheus data model naming rules.
///
/// - metric names match `[a-zA-Z_:][a-zA-Z0-9_:]*`
/// - label names match `[a-zA-Z_][a-zA-Z0-9_]*`
/// - names starting with `__` are reserved
/// - `le` is reserved on histograms and `quantile` on summaries
///
/// # Examples
///
/// ```rust
/// use registro::metrics::MetricKind;
/// use registro::naming::{NameValidator, PrometheusNames};
///
/// assert!(PrometheusNames.is_valid_metric_name("http_requests_total"));
/// assert!(!PrometheusNames.is_valid_metric_name("2xx"));
/// assert!(!PrometheusNames.is_valid_label_name("le", MetricKind::Histogram));
/// assert!(PrometheusNames.is_valid_label_name("le", MetricKind::Gauge));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusNames;

impl PrometheusNames {
    fn is_valid_name(name: &str, allow_colon: bool) -> bool {
        if name.starts_with("__") {
            return false;
        }
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        let allowed = |c: char| c.is_ascii_alphanumeric() || c == '_' || (allow_colon && c == ':');
        !first.is_ascii_digit() && allowed(first) && chars.all(allowed)
    }
}

impl NameValidator for PrometheusNames {
    fn is_valid_metric_name(&self, name: &str) -> bool {
        Self::is_valid_name(name, true)
    }

    fn is_valid_label_name(&self, name: &str, kind: MetricKind) -> bool {
        if !Self::is_valid_name(name, false) {
            return false;
        }
        match kind {
            MetricKind::Histogram => name != "le",
            MetricKind::Summary => name != "quantile",
            _ => true,
        }
    }
}

/// Accepts every name.
///
/// Useful when names are validated elsewhere, or in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnyName;

impl NameValidator for AnyName {
    fn is_valid_metric_name(&self, _name: &str) -> bool {
        true
    }

    fn is_valid_label_name(&self, _name: &str, _kind: MetricKind) -> bool {
        true
    }
}
