//! GitHub integration: commit history client, lead-time resolver and the
//! deployment webhook.

pub mod client;
pub mod lead_time;
pub mod webhook;

pub use client::{CommitHistory, GithubClient};
pub use lead_time::{LeadTime, LeadTimeResolver, Origin};
