use std::net::SocketAddr;

use serde::Deserialize;

use dora_core::error::{DoraError, Result};
use dora_core::model::Team;

pub const DEFAULT_SNAPSHOT_FILE: &str = "dora-exporter.prom";
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const STORAGE_FILE_PATH_ENV: &str = "STORAGE_FILE_PATH";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    #[serde(default)]
    pub github: GithubSection,

    #[serde(default)]
    pub catalog: CatalogSection,

    #[serde(default)]
    pub teams: Vec<Team>,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub storage: StorageSection,
}

impl ExporterConfig {
    /// Fill unset values from the environment (`GITHUB_TOKEN`, `STORAGE_FILE_PATH`).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let blank = |s: &Option<String>| s.as_deref().map_or(true, str::is_empty);

        if blank(&self.github.token) {
            self.github.token = lookup(GITHUB_TOKEN_ENV).filter(|t| !t.is_empty());
        }
        if blank(&self.storage.file.path) {
            self.storage.file.path = lookup(STORAGE_FILE_PATH_ENV).filter(|p| !p.is_empty());
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.github.validate()?;
        self.catalog.validate()?;
        self.server.validate()?;

        for team in &self.teams {
            if team.name.trim().is_empty() {
                return Err(DoraError::Config("teams[].name must not be empty".into()));
            }
        }
        Ok(())
    }

    /// Snapshot file location after environment fallback.
    pub fn snapshot_path(&self) -> &str {
        self.storage.file.path.as_deref().unwrap_or(DEFAULT_SNAPSHOT_FILE)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GithubSection {
    /// Owner used for repository names without an `owner/` prefix.
    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub token: Option<String>,

    /// API root; a path prefix is kept (`https://ghe.example.com/api/v3`).
    #[serde(default = "default_github_base_url")]
    pub base_url: String,
}

impl Default for GithubSection {
    fn default() -> Self {
        Self {
            owner: String::new(),
            token: None,
            base_url: default_github_base_url(),
        }
    }
}

impl GithubSection {
    pub fn validate(&self) -> Result<()> {
        if self.token.as_deref().map_or(true, str::is_empty) {
            return Err(DoraError::Config(format!(
                "github.token is required (or set {GITHUB_TOKEN_ENV})"
            )));
        }
        reqwest::Url::parse(&self.base_url)
            .map_err(|e| DoraError::Config(format!("github.base_url is not a valid url: {e}")))?;
        Ok(())
    }

    pub fn token(&self) -> &str {
        self.token.as_deref().unwrap_or_default()
    }
}

fn default_github_base_url() -> String {
    "https://api.github.com".into()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogMode {
    #[default]
    Static,
    Backstage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSection {
    #[serde(default)]
    pub mode: CatalogMode,

    #[serde(default)]
    pub endpoint: Option<String>,
}

impl CatalogSection {
    pub fn validate(&self) -> Result<()> {
        if self.mode == CatalogMode::Backstage {
            let endpoint = self.endpoint.as_deref().ok_or_else(|| {
                DoraError::Config("catalog.endpoint is required for mode backstage".into())
            })?;
            reqwest::Url::parse(endpoint).map_err(|e| {
                DoraError::Config(format!("catalog.endpoint is not a valid url: {e}"))
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            DoraError::Config(format!("server.listen must be a valid SocketAddr: {e}"))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    #[serde(default)]
    pub file: FileStorage,
}

/// Prometheus metrics snapshot storage.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileStorage {
    #[serde(default)]
    pub path: Option<String>,
}
