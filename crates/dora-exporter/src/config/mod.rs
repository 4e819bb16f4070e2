//! Exporter config loader (strict parsing).

pub mod schema;

use std::fs;

use dora_core::error::{DoraError, Result};

pub use schema::{
    CatalogMode, CatalogSection, ExporterConfig, GithubSection, ServerSection,
    DEFAULT_SNAPSHOT_FILE,
};

pub fn load_from_file(path: &str) -> Result<ExporterConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| DoraError::Config(format!("read config {path} failed: {e}")))?;
    let cfg = load_from_str(&s)?;
    tracing::info!(file = %path, "config loaded");
    Ok(cfg)
}

/// Parse with environment fallbacks read from the process environment.
pub fn load_from_str(s: &str) -> Result<ExporterConfig> {
    load_from_str_with_env(s, |k| std::env::var(k).ok())
}

pub fn load_from_str_with_env(
    s: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ExporterConfig> {
    let mut cfg: ExporterConfig = serde_yaml::from_str(s)
        .map_err(|e| DoraError::Config(format!("invalid yaml: {e}")))?;
    cfg.apply_env(lookup);
    cfg.validate()?;

    tracing::info!(file = %cfg.snapshot_path(), "config storage");
    for team in &cfg.teams {
        tracing::info!(
            team = %team.name,
            repos = team.repositories.len(),
            projects = team.projects.len(),
            "config team"
        );
    }
    Ok(cfg)
}
