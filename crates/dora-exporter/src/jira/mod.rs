//! Incident ingestor: Jira issue webhooks.

pub mod time;
pub mod webhook;

pub use time::JiraTime;
pub use webhook::{Issue, IssueEvent};
