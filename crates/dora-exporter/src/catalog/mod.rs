//! Team catalog: maps repositories and issue-tracker projects to owning teams.
//!
//! Two variants share the `TeamCatalog` capability set:
//! - `StaticCatalog`: in-memory table built once from config.
//! - `BackstageCatalog`: one registry query per call, no caching.
//!
//! Both are total: any unmapped input or lookup failure resolves to
//! [`UNKNOWN_TEAM`]. The variant is picked once at startup.

pub mod backstage;
pub mod static_table;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use dora_core::error::{DoraError, Result};

use crate::config::{CatalogMode, ExporterConfig};

pub use backstage::BackstageCatalog;
pub use static_table::StaticCatalog;

/// Sentinel team for unmapped repositories and projects.
pub const UNKNOWN_TEAM: &str = "Unknown";

/// Upper bound for a single registry lookup.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(15);

#[async_trait]
pub trait TeamCatalog: Send + Sync {
    fn mode(&self) -> &'static str;

    /// Owning team of `owner/name`, or [`UNKNOWN_TEAM`].
    async fn resolve_by_repository(&self, repo_full_name: &str) -> String;

    /// Owning team of an issue-tracker project key, or [`UNKNOWN_TEAM`].
    async fn resolve_by_project(&self, project_key: &str) -> String;
}

/// Build the catalog variant selected by `catalog.mode`.
pub fn from_config(cfg: &ExporterConfig) -> Result<Arc<dyn TeamCatalog>> {
    let catalog: Arc<dyn TeamCatalog> = match cfg.catalog.mode {
        CatalogMode::Static => Arc::new(StaticCatalog::new(&cfg.teams)),
        CatalogMode::Backstage => {
            let endpoint = cfg.catalog.endpoint.as_deref().ok_or_else(|| {
                DoraError::Config("catalog.endpoint is required for mode backstage".into())
            })?;
            Arc::new(BackstageCatalog::new(endpoint, LOOKUP_TIMEOUT)?)
        }
    };
    tracing::info!(mode = catalog.mode(), "team catalog ready");
    Ok(catalog)
}
