//! Metric data model: families, label sets and snapshots.

pub mod family;
pub mod labels;
pub mod snapshot;

pub use family::{MetricFamily, MetricKind};
pub use labels::LabelSet;
pub use snapshot::{SeriesKey, Snapshot};
