use axum::extract::State;
use axum::http::StatusCode;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use dora_core::error::{DoraError, Result};
use dora_core::metric::{LabelSet, MetricFamily};

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::github::lead_time::seconds_since;
use crate::jira::time::JiraTime;
use crate::metrics::Observation;

#[derive(Debug, Default, Deserialize)]
pub struct StatusCategory {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "statusCategory")]
    pub status_category: StatusCategory,
}

#[derive(Debug, Default, Deserialize)]
pub struct IssueType {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub created: JiraTime,
    #[serde(default)]
    pub project: Project,
    #[serde(default, rename = "issuetype")]
    pub issue_type: IssueType,
}

#[derive(Debug, Default, Deserialize)]
pub struct Issue {
    /// e.g. `INF-123`.
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

impl Issue {
    /// Seconds since the issue was created, never negative.
    ///
    /// A zero-time `created` yields zero.
    pub fn duration(&self, now: DateTime<Utc>) -> f64 {
        match self.fields.created.0 {
            Some(created) => seconds_since(created.with_timezone(&Utc), now),
            None => 0.0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IssueEvent {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub issue: Issue,
}

impl IssueEvent {
    /// Every field is optional; only a body that is not a JSON object is malformed.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| DoraError::MalformedEvent(e.to_string()))
    }
}

pub fn incident_labels(project: &str, team: &str) -> LabelSet {
    LabelSet::new().with("project", project).with("team", team)
}

pub async fn ingest(state: &AppState, event: &IssueEvent, now: DateTime<Utc>) -> Result<LabelSet> {
    let issue = &event.issue;
    let project = issue.fields.project.key.as_str();
    let team = state.catalog().resolve_by_project(project).await;
    let labels = incident_labels(project, &team);

    if issue.fields.created.is_zero() {
        tracing::warn!(key = %issue.key, "issue has no created time, recording zero duration");
    }
    let duration = issue.duration(now);

    state.metrics().record(&[
        Observation::Increment(MetricFamily::Incidents, labels.clone()),
        Observation::Add(MetricFamily::IncidentsDurationSum, labels.clone(), duration),
    ])?;

    tracing::info!(
        endpoint = "jira",
        issue_status = %issue.fields.status.name,
        event = %event.event,
        key = %issue.key,
        team = %team,
        created = ?issue.fields.created.0,
        duration,
        issue_type = %issue.fields.issue_type.name,
        project = %project,
        "incident recorded"
    );
    Ok(labels)
}

/// `POST /api/jira`
pub async fn incident(
    State(state): State<AppState>,
    body: Bytes,
) -> std::result::Result<StatusCode, ApiError> {
    let payload = IssueEvent::from_slice(&body).map_err(|e| {
        tracing::error!(endpoint = "jira", error = %e, "rejecting event");
        e
    })?;
    ingest(&state, &payload, Utc::now()).await?;
    Ok(StatusCode::OK)
}
