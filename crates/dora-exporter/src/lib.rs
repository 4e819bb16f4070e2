//! DORA exporter library entry.
//!
//! This crate wires the team catalog, the GitHub lead-time resolver, the
//! metrics accumulator and the two webhook ingestors into an HTTP service.
//! It is intended to be consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod catalog;
pub mod config;
pub mod error;
pub mod github;
pub mod jira;
pub mod metrics;
pub mod ops;
pub mod router;
