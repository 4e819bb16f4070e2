//! Lead time: elapsed time since the true origin of a deployed change.
//!
//! The deployed commit is fetched first. If its message references a pull
//! request (`#<digits>`, first match), the origin is the first commit of that
//! pull request in API order; otherwise the commit itself is the origin.
//! Squash merges make the deploy commit's own timestamp the merge time, hence
//! the pull request hop.
//!
//! API order is assumed to be chronological; nothing here re-sorts commits.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use dora_core::error::ResolutionError;

use super::client::CommitHistory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// No pull request reference; the deployed commit is authoritative.
    Commit,
    /// First commit of the referenced pull request.
    PullRequest { number: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeadTime {
    pub origin: Origin,
    pub origin_at: DateTime<Utc>,
    /// Never negative; clock skew clamps to zero.
    pub seconds: f64,
}

impl LeadTime {
    pub fn between(origin: Origin, origin_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            origin,
            origin_at,
            seconds: seconds_since(origin_at, now),
        }
    }
}

/// `now - then` in fractional seconds, clamped at zero.
pub fn seconds_since(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let elapsed = now.signed_duration_since(then);
    (elapsed.num_milliseconds() as f64 / 1000.0).max(0.0)
}

#[derive(Clone)]
pub struct LeadTimeResolver {
    history: Arc<dyn CommitHistory>,
}

impl LeadTimeResolver {
    pub fn new(history: Arc<dyn CommitHistory>) -> Self {
        Self { history }
    }

    /// Timestamp of the change's origin.
    pub async fn origin(
        &self,
        repo: &str,
        sha: &str,
    ) -> Result<(Origin, DateTime<Utc>), ResolutionError> {
        let commit = self.history.commit(repo, sha).await?;

        let Some(number) = commit.pull_request_reference() else {
            tracing::debug!(%repo, %sha, date = "current_commit", "no pull request reference");
            return Ok((Origin::Commit, commit.authored_at));
        };

        let pr = self.history.pull_request(repo, number).await?;
        let first = pr.first_commit().ok_or(ResolutionError::EmptyPullRequest {
            number,
            commit_authored_at: commit.authored_at,
        })?;

        tracing::debug!(%repo, %sha, pr = number, date = "pr_first_commit", "origin resolved");
        Ok((Origin::PullRequest { number }, first.authored_at))
    }

    pub async fn compute(
        &self,
        repo: &str,
        sha: &str,
        now: DateTime<Utc>,
    ) -> Result<LeadTime, ResolutionError> {
        let (origin, origin_at) = self.origin(repo, sha).await?;
        Ok(LeadTime::between(origin, origin_at, now))
    }
}
