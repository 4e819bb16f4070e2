//! Shared application state.
//!
//! Built once at startup and handed to every handler; there is no global
//! catalog or accumulator.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dora_core::error::{DoraError, Result};

use crate::catalog::{self, TeamCatalog};
use crate::config::ExporterConfig;
use crate::github::client::{CommitHistory, GithubClient, API_TIMEOUT};
use crate::github::LeadTimeResolver;
use crate::metrics::MetricsAccumulator;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    snapshot_path: PathBuf,
    catalog: Arc<dyn TeamCatalog>,
    lead_time: LeadTimeResolver,
    metrics: Arc<MetricsAccumulator>,
}

impl AppState {
    /// Build application state from config.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: &ExporterConfig) -> Result<Self> {
        let catalog = catalog::from_config(cfg)?;
        let github: Arc<dyn CommitHistory> = Arc::new(GithubClient::new(&cfg.github, API_TIMEOUT)?);
        Ok(Self::from_parts(
            cfg.snapshot_path(),
            catalog,
            github,
            Arc::new(MetricsAccumulator::new()),
        ))
    }

    pub fn from_parts(
        snapshot_path: impl Into<PathBuf>,
        catalog: Arc<dyn TeamCatalog>,
        history: Arc<dyn CommitHistory>,
        metrics: Arc<MetricsAccumulator>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                snapshot_path: snapshot_path.into(),
                catalog,
                lead_time: LeadTimeResolver::new(history),
                metrics,
            }),
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.inner.snapshot_path
    }

    pub fn catalog(&self) -> &dyn TeamCatalog {
        self.inner.catalog.as_ref()
    }

    pub fn lead_time(&self) -> &LeadTimeResolver {
        &self.inner.lead_time
    }

    pub fn metrics(&self) -> Arc<MetricsAccumulator> {
        Arc::clone(&self.inner.metrics)
    }

    /// Reconcile the accumulator with the snapshot on disk, off the async
    /// runtime. Never fatal: the accumulator is serving afterwards either way.
    pub async fn reconcile(&self) {
        let metrics = self.metrics();
        let path = self.inner.snapshot_path.clone();
        let result = tokio::task::spawn_blocking(move || metrics.load_and_reconcile(path))
            .await
            .map_err(|e| DoraError::Io(std::io::Error::other(e)))
            .and_then(|r| r);

        let file = self.snapshot_path().display();
        match result {
            Ok(true) => {}
            Ok(false) => tracing::info!(file = %file, "started with empty metrics"),
            Err(e) => tracing::error!(file = %file, error = %e, "snapshot not restored, serving empty metrics"),
        }
    }

    /// Write the current snapshot to disk off the async runtime.
    pub async fn persist(&self) -> Result<()> {
        let metrics = self.metrics();
        let path = self.inner.snapshot_path.clone();
        tokio::task::spawn_blocking(move || metrics.persist_snapshot(path))
            .await
            .map_err(|e| DoraError::Io(std::io::Error::other(e)))?
    }

    /// Final flush on shutdown: stop updates, persist once more, stop.
    pub async fn shutdown(&self) -> Result<()> {
        self.inner.metrics.begin_flush();
        let result = self.persist().await;
        self.inner.metrics.stop();
        result
    }
}
