//! Read-only GitHub REST client for commit and pull-request metadata.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use dora_core::error::{DoraError, ResolutionError, Result};
use dora_core::model::{CommitRef, PullRequestRef};

use crate::config::GithubSection;

/// Upper bound for a single API call.
pub const API_TIMEOUT: Duration = Duration::from_secs(15);

type Fetch<T> = std::result::Result<T, ResolutionError>;

/// Source of commit history. Implemented by [`GithubClient`] and by test fakes.
#[async_trait]
pub trait CommitHistory: Send + Sync {
    async fn commit(&self, repo: &str, sha: &str) -> Fetch<CommitRef>;

    /// Commits of a pull request, in the order the host returns them.
    async fn pull_request(&self, repo: &str, number: u64) -> Fetch<PullRequestRef>;
}

#[derive(Debug, Deserialize)]
struct Author {
    date: DateTime<Utc>,
}

/// `GET /repos/{repo}/git/commits/{sha}`
#[derive(Debug, Deserialize)]
struct GitCommit {
    sha: String,
    author: Author,
    message: String,
}

/// One element of `GET /repos/{repo}/pulls/{n}/commits`.
#[derive(Debug, Deserialize)]
struct PullCommit {
    sha: String,
    commit: PullCommitBody,
}

#[derive(Debug, Deserialize)]
struct PullCommitBody {
    author: Author,
    message: String,
}

#[derive(Debug)]
pub struct GithubClient {
    client: reqwest::Client,
    base_url: Url,
    owner: String,
    token: String,
}

impl GithubClient {
    pub fn new(cfg: &GithubSection, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(&cfg.base_url)
            .map_err(|e| DoraError::Config(format!("invalid github base url: {e}")))?;
        // Relative joins keep a path prefix such as `/api/v3` only under a trailing slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dora-exporter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DoraError::Config(format!("github http client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            owner: cfg.owner.clone(),
            token: cfg.token().to_string(),
        })
    }

    /// `owner/name`; bare names get the configured owner.
    pub fn qualify(&self, repo: &str) -> String {
        if repo.contains('/') || self.owner.is_empty() {
            repo.to_string()
        } else {
            format!("{}/{}", self.owner, repo)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Fetch<T> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ResolutionError::FetchFailed(format!("bad url {path}: {e}")))?;
        tracing::debug!(%url, "github api call");

        let body = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ResolutionError::FetchFailed(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| ResolutionError::FetchFailed(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| ResolutionError::DecodeFailed(e.to_string()))
    }
}

#[async_trait]
impl CommitHistory for GithubClient {
    async fn commit(&self, repo: &str, sha: &str) -> Fetch<CommitRef> {
        let repository = self.qualify(repo);
        let c: GitCommit = self
            .get_json(&format!("repos/{repository}/git/commits/{sha}"))
            .await?;
        tracing::debug!(%repository, commit_info = %sha, "commit fetched");
        Ok(CommitRef {
            repository,
            sha: c.sha,
            authored_at: c.author.date,
            message: c.message,
        })
    }

    async fn pull_request(&self, repo: &str, number: u64) -> Fetch<PullRequestRef> {
        let repository = self.qualify(repo);
        let commits: Vec<PullCommit> = self
            .get_json(&format!("repos/{repository}/pulls/{number}/commits"))
            .await?;
        tracing::debug!(%repository, pull_request = number, commits = commits.len(), "pull request fetched");
        Ok(PullRequestRef {
            commits: commits
                .into_iter()
                .map(|c| CommitRef {
                    repository: repository.clone(),
                    sha: c.sha,
                    authored_at: c.commit.author.date,
                    message: c.commit.message,
                })
                .collect(),
            repository,
            number,
        })
    }
}
