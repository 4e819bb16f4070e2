//! Source-control and ownership data model.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A single commit as seen by the lead-time resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRef {
    /// `owner/name`.
    pub repository: String,
    pub sha: String,
    pub authored_at: DateTime<Utc>,
    pub message: String,
}

impl CommitRef {
    /// Pull request number referenced by the commit message, if any.
    pub fn pull_request_reference(&self) -> Option<u64> {
        pull_request_reference(&self.message)
    }
}

/// A pull request and its commits in the order the host returned them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub repository: String,
    pub number: u64,
    pub commits: Vec<CommitRef>,
}

impl PullRequestRef {
    pub fn first_commit(&self) -> Option<&CommitRef> {
        self.commits.first()
    }
}

/// A team and the repositories/projects it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Team {
    pub name: String,
    #[serde(default, rename = "github_repositories")]
    pub repositories: Vec<String>,
    #[serde(default, rename = "jira_projects")]
    pub projects: Vec<String>,
}

fn pr_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"#(\d+)").expect("literal pattern compiles")
    })
}

/// Extract the first `#<digits>` reference from a commit message.
///
/// Matches both "Merge pull request #1 from org/branch" and squash titles like
/// "Fix retries (#1786)". Any `#NNN` counts, including unrelated issue links.
pub fn pull_request_reference(message: &str) -> Option<u64> {
    let caps = pr_pattern().captures(message)?;
    caps.get(1)?.as_str().parse().ok()
}
