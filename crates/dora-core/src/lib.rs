//! DORA exporter core: error types, the metric data model, the text exposition
//! codec and the source-control data model.
//!
//! This crate carries no runtime or HTTP dependencies so the accumulator's
//! persistence format can be tested and reused on its own.
//!
//! # Panic policy
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `DoraError`/`Result` so a corrupt
//! snapshot file or odd commit message never crashes the exporter.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod metric;
pub mod model;
pub mod protocol;

/// Shared result type.
pub use error::{DoraError, ResolutionError, Result};
pub use metric::{LabelSet, MetricFamily, MetricKind, Snapshot};
