//! Live DORA metrics and their durable snapshot.

pub mod accumulator;

pub use accumulator::{Lifecycle, MetricsAccumulator, Observation, ReconcileReport};
