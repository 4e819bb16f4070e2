//! Backstage software-catalog lookup.
//!
//! `GET {endpoint}/api/catalog/entities?filter=metadata.annotations.github.com/project-slug=<repo>`
//! returns `[{spec: {owner}}]`; the first entity's owner is the team. A path
//! in `endpoint` is kept as a prefix.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use dora_core::error::{DoraError, ResolutionError, Result};

use super::{TeamCatalog, UNKNOWN_TEAM};

const ENTITIES_PATH: &str = "api/catalog/entities";
const PROJECT_SLUG_ANNOTATION: &str = "metadata.annotations.github.com/project-slug";

#[derive(Debug, Default, Deserialize)]
struct Entity {
    #[serde(default)]
    spec: EntitySpec,
}

#[derive(Debug, Default, Deserialize)]
struct EntitySpec {
    #[serde(default)]
    owner: String,
}

#[derive(Debug)]
pub struct BackstageCatalog {
    client: reqwest::Client,
    endpoint: Url,
}

impl BackstageCatalog {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let mut endpoint = Url::parse(endpoint)
            .map_err(|e| DoraError::Config(format!("invalid backstage endpoint: {e}")))?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DoraError::Config(format!("backstage http client: {e}")))?;
        tracing::info!(endpoint = %endpoint, "backstage catalog configured");
        Ok(Self { client, endpoint })
    }

    fn entities_url(&self, filter: &str) -> std::result::Result<Url, ResolutionError> {
        let mut url = self
            .endpoint
            .join(ENTITIES_PATH)
            .map_err(|e| ResolutionError::FetchFailed(format!("bad url {ENTITIES_PATH}: {e}")))?;
        url.query_pairs_mut().append_pair("filter", filter);
        Ok(url)
    }

    async fn fetch_owner(&self, repo_full_name: &str) -> std::result::Result<String, ResolutionError> {
        let filter = format!("{PROJECT_SLUG_ANNOTATION}={repo_full_name}");
        let url = self.entities_url(&filter)?;
        tracing::debug!(%url, "catalog query");

        let body = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ResolutionError::FetchFailed(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| ResolutionError::FetchFailed(e.to_string()))?;

        let entities: Vec<Entity> = serde_json::from_slice(&body)
            .map_err(|e| ResolutionError::DecodeFailed(e.to_string()))?;

        Ok(entities
            .into_iter()
            .next()
            .map(|e| e.spec.owner)
            .unwrap_or_default())
    }
}

#[async_trait]
impl TeamCatalog for BackstageCatalog {
    fn mode(&self) -> &'static str {
        "backstage"
    }

    async fn resolve_by_repository(&self, repo_full_name: &str) -> String {
        match self.fetch_owner(repo_full_name).await {
            Ok(owner) if !owner.is_empty() => {
                tracing::info!(%owner, repository = %repo_full_name, "owner determined from backstage");
                owner
            }
            Ok(_) => {
                tracing::info!(repository = %repo_full_name, "owner could not be determined from backstage");
                UNKNOWN_TEAM.to_string()
            }
            Err(e) => {
                tracing::warn!(repository = %repo_full_name, kind = e.kind(), error = %e, "backstage lookup failed");
                UNKNOWN_TEAM.to_string()
            }
        }
    }

    async fn resolve_by_project(&self, project_key: &str) -> String {
        tracing::info!(project = %project_key, "backstage has no project ownership, using sentinel team");
        UNKNOWN_TEAM.to_string()
    }
}
