//! Wire formats shared by the exporter.
//!
//! - Text exposition: the persisted snapshot file and the `/metrics` body are
//!   the same Prometheus text format, so one codec serves both.
//!
//! All parsers are panic-free: malformed input is reported as `DoraError`
//! instead of panicking or indexing raw buffers.

pub mod exposition;

pub use exposition::{parse, render, DeclaredType, ParsedFamily, Sample};
