//! # Registro - Concurrent Metric Registry
//!
//! An in-process metrics core in the Prometheus data model: counters, gauges,
//! histograms, summaries and info metrics, grouped into label-keyed families
//! and owned by a thread-safe registry that produces consistent snapshots.
//!
//! Exposition (text format, protobuf, HTTP) is left to the caller: collected
//! [`snapshot`] values are plain data, optionally `serde`-serializable.
//!
//! ## Data Model
//!
//! ```text
//! Registry
//!  ├── Family<Counter>   "http_requests_total"  {service="api"}
//!  │     ├── {method="GET"}  ─► Arc<Counter>
//!  │     └── {method="POST"} ─► Arc<Counter>
//!  ├── Family<Gauge>     "queue_depth"
//!  │     └── {}              ─► Arc<Gauge>
//!  └── Family<Histogram> "request_duration_seconds"
//!        └── {route="/"}     ─► Arc<Histogram>
//! ```
//!
//! - A **family** is identified by its name. A name is bound to a single metric
//!   type for the lifetime of the registry.
//! - Each family holds one metric per distinct [`Labels`] value. Its constant
//!   labels are attached to every sample it reports, ahead of the instance
//!   labels.
//! - Metrics are shared as `Arc<T>` and updated through `&self` from any thread.
//!
//! ## Metric Types
//!
//! | Type | Operations | Use Case |
//! |------|------------|----------|
//! | [`Counter`](metrics::counter::Counter) | increment | Requests served, bytes sent |
//! | [`Gauge`](metrics::gauge::Gauge) | increment, decrement, set | Queue depth, temperature |
//! | [`Histogram`](metrics::histogram::Histogram) | observe, bulk observe | Latency distributions |
//! | [`Summary`](metrics::summary::Summary) | observe | Sliding-window quantiles |
//! | [`Info`](metrics::info::Info) | none | Build and version metadata |
//!
//! ## Quick Start
//!
//! ```rust
//! use registro::metrics::counter::Counter;
//! use registro::metrics::histogram::{BucketBoundaries, Histogram};
//! use registro::{InsertBehavior, Labels, Registry};
//!
//! let registry = Registry::new(InsertBehavior::Merge);
//!
//! let requests = registry.add_family::<Counter>(
//!     "http_requests_total",
//!     "Requests served.",
//!     Labels::from([("service", "api")]),
//! )?;
//! requests.get_or_add(&Labels::from([("method", "GET")]))?.increment();
//!
//! registry.add_family::<Histogram>("request_duration_seconds", "Latency.", Labels::new())?;
//! registry.observe::<Histogram>(
//!     "request_duration_seconds",
//!     &Labels::from([("route", "/")]),
//!     0.042,
//!     BucketBoundaries::default(),
//! )?;
//!
//! for family in registry.collect(false) {
//!     println!("{} ({}): {} series", family.name, family.kind, family.metrics.len());
//! }
//! # Ok::<(), registro::Error>(())
//! ```
//!
//! ## Thread Safety
//!
//! Every type is `Send + Sync`. Counter and gauge updates are single atomic
//! read-modify-write loops, histogram observations touch one bucket atomic and
//! the running sum, and summaries serialize on a mutex. Registration and lookup
//! are double-checked: the common path takes shared locks only, and concurrent
//! callers racing on the same family or label set all receive the same `Arc`.
//!
//! ## Registration Policy
//!
//! | [`InsertBehavior`] | Same name, same type | Same name, other type |
//! |--------------------|----------------------|-----------------------|
//! | `Merge` (default) | existing family returned | [`Error::NameConflict`] |
//! | `Throw` | [`Error::DuplicateFamily`] | [`Error::NameConflict`] |
//!
//! ## Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | `Serialize`/`Deserialize` for [`snapshot`] types and [`MetricKind`](metrics::MetricKind) |

pub mod builder;
pub mod collectable;
pub mod error;
pub mod family;
pub mod labels;
pub mod metrics;
pub mod naming;
pub mod registry;
pub mod snapshot;

pub use collectable::Collectable;
pub use error::{Error, Result};
pub use family::Family;
pub use labels::Labels;
pub use registry::{InsertBehavior, Registry};
