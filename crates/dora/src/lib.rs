//! Top-level facade crate for the DORA exporter.
//!
//! Re-exports core types and the exporter library so users can depend on a single crate.

pub mod core {
    pub use dora_core::*;
}

pub mod exporter {
    pub use dora_exporter::*;
}
