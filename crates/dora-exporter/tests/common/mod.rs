//! Shared fakes and helpers for exporter integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Utc};

use dora_core::error::ResolutionError;
use dora_core::model::{CommitRef, PullRequestRef, Team};
use dora_exporter::app_state::AppState;
use dora_exporter::catalog::StaticCatalog;
use dora_exporter::github::CommitHistory;
use dora_exporter::metrics::MetricsAccumulator;

/// In-memory commit history.
#[derive(Default)]
pub struct FakeHistory {
    commits: HashMap<String, CommitRef>,
    pulls: HashMap<u64, Vec<CommitRef>>,
    fail_commits: bool,
    pub commit_calls: AtomicUsize,
    pub pull_calls: AtomicUsize,
}

impl FakeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commit(mut self, sha: &str, message: &str, at: DateTime<Utc>) -> Self {
        self.commits.insert(sha.to_string(), commit("org/svc", sha, message, at));
        self
    }

    pub fn with_pull(mut self, number: u64, commits: &[(&str, DateTime<Utc>)]) -> Self {
        let commits = commits
            .iter()
            .map(|(sha, at)| commit("org/svc", sha, "work", *at))
            .collect();
        self.pulls.insert(number, commits);
        self
    }

    /// Every commit lookup fails as if the API were unreachable.
    pub fn unreachable(mut self) -> Self {
        self.fail_commits = true;
        self
    }
}

pub fn commit(repo: &str, sha: &str, message: &str, at: DateTime<Utc>) -> CommitRef {
    CommitRef {
        repository: repo.to_string(),
        sha: sha.to_string(),
        authored_at: at,
        message: message.to_string(),
    }
}

#[async_trait]
impl CommitHistory for FakeHistory {
    async fn commit(&self, _repo: &str, sha: &str) -> Result<CommitRef, ResolutionError> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_commits {
            return Err(ResolutionError::FetchFailed("connection refused".into()));
        }
        self.commits
            .get(sha)
            .cloned()
            .ok_or_else(|| ResolutionError::FetchFailed(format!("404 for {sha}")))
    }

    async fn pull_request(&self, repo: &str, number: u64) -> Result<PullRequestRef, ResolutionError> {
        self.pull_calls.fetch_add(1, Ordering::SeqCst);
        let commits = self
            .pulls
            .get(&number)
            .cloned()
            .ok_or_else(|| ResolutionError::FetchFailed(format!("404 for #{number}")))?;
        Ok(PullRequestRef {
            repository: repo.to_string(),
            number,
            commits,
        })
    }
}

pub fn teams() -> Vec<Team> {
    vec![
        Team {
            name: "Payments".into(),
            repositories: vec!["org/svc".into(), "org/borscht".into()],
            projects: vec!["PAY".into()],
        },
        Team {
            name: "Infra".into(),
            repositories: vec!["org/provisioner".into()],
            projects: vec!["INF".into()],
        },
    ]
}

/// Serving state with a static catalog and the given history.
pub fn app_state(snapshot: &Path, history: FakeHistory) -> AppState {
    let metrics = Arc::new(MetricsAccumulator::new());
    metrics.load_and_reconcile(snapshot).unwrap();
    AppState::from_parts(
        snapshot,
        Arc::new(StaticCatalog::new(&teams())),
        Arc::new(history),
        metrics,
    )
}

/// Bind `router` on an ephemeral localhost port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}
