//! The collection protocol.
//!
//! Anything that can produce [`MetricFamily`] snapshots implements
//! [`Collectable`]. The [`Registry`](crate::Registry) and every
//! [`Family`](crate::Family) do; exposition code can fan in any number of them
//! with [`collect_from`].
//!
//! # Example
//!
//! ```rust
//! use registro::collectable::{collect_from, Collectable};
//! use registro::metrics::counter::Counter;
//! use registro::{Labels, Registry};
//!
//! let app = Registry::default();
//! let runtime = Registry::default();
//! app.add_family::<Counter>("requests_total", "", Labels::new())?;
//! app.inc::<Counter>("requests_total", &Labels::new(), 1.0, ())?;
//! runtime.add_family::<Counter>("gc_runs_total", "", Labels::new())?;
//! runtime.inc::<Counter>("gc_runs_total", &Labels::new(), 3.0, ())?;
//!
//! let sources: [&dyn Collectable; 2] = [&app, &runtime];
//! let families = collect_from(sources, false);
//! let names: Vec<_> = families.iter().map(|f| f.name.as_str()).collect();
//! assert_eq!(names, ["requests_total", "gc_runs_total"]);
//! # Ok::<(), registro::Error>(())
//! ```

use crate::snapshot::MetricFamily;

/// A source of metric snapshots.
pub trait Collectable: Send + Sync {
    /// Returns a snapshot of every non-empty family.
    ///
    /// When `clear` is set, the collected metrics are dropped from their
    /// families after the snapshot is taken.
    fn collect(&self, clear: bool) -> Vec<MetricFamily>;
}

/// Collects from every source in iteration order and concatenates the results.
pub fn collect_from<'a, I>(sources: I, clear: bool) -> Vec<MetricFamily>
where
    I: IntoIterator<Item = &'a dyn Collectable>,
{
    sources
        .into_iter()
        .flat_map(|source| source.collect(clear))
        .collect()
}
