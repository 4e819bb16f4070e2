//! Deployment ingestor: GitHub `deployment_status` webhooks.
//!
//! Other event types are acknowledged with 202 and cause no metric change.
//! Lead-time failures never fail the request: the deployment is still counted
//! and the duration degrades to zero.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use dora_core::error::{DoraError, ResolutionError, Result};
use dora_core::metric::{LabelSet, MetricFamily};

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::github::lead_time::{LeadTime, Origin};
use crate::metrics::Observation;

pub const EVENT_HEADER: &str = "X-GitHub-Event";
pub const DEPLOYMENT_STATUS_EVENT: &str = "deployment_status";

#[derive(Debug, Deserialize)]
pub struct DeploymentStatus {
    pub state: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub struct Deployment {
    pub sha: String,
    pub environment: String,
    #[serde(default, rename = "ref")]
    pub git_ref: String,
    #[serde(default)]
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub name: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct Sender {
    #[serde(default)]
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct DeploymentStatusEvent {
    #[serde(default)]
    pub action: String,
    pub deployment_status: DeploymentStatus,
    pub deployment: Deployment,
    pub repository: Repository,
    #[serde(default)]
    pub sender: Option<Sender>,
}

impl DeploymentStatusEvent {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| DoraError::MalformedEvent(e.to_string()))
    }
}

/// Result of ingesting one deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentRecord {
    pub labels: LabelSet,
    pub lead_time: Option<LeadTime>,
    pub duration_seconds: f64,
}

pub fn deployment_labels(repo: &str, environment: &str, status: &str, team: &str) -> LabelSet {
    LabelSet::new()
        .with("repo", repo)
        .with("environment", environment)
        .with("status", status)
        .with("team", team)
}

/// Resolve team and lead time (outside any lock), then record.
pub async fn ingest(
    state: &AppState,
    event: &DeploymentStatusEvent,
    now: DateTime<Utc>,
) -> Result<DeploymentRecord> {
    let repo = event.repository.full_name.as_str();
    let sha = event.deployment.sha.as_str();

    let team = state.catalog().resolve_by_repository(repo).await;
    let labels = deployment_labels(
        repo,
        &event.deployment.environment,
        &event.deployment_status.state,
        &team,
    );

    let lead_time = match state.lead_time().compute(repo, sha, now).await {
        Ok(lt) => Some(lt),
        Err(ResolutionError::EmptyPullRequest {
            number,
            commit_authored_at,
        }) => {
            tracing::warn!(%repo, %sha, pr = number, "pull request has no commits, using deploy commit");
            Some(LeadTime::between(Origin::Commit, commit_authored_at, now))
        }
        Err(e) => {
            tracing::warn!(%repo, %sha, kind = e.kind(), error = %e, "lead time unavailable, recording zero duration");
            None
        }
    };
    let duration_seconds = lead_time.map_or(0.0, |lt| lt.seconds);
    tracing::debug!(commit_duration = duration_seconds, "lead time");

    state.metrics().record(&[
        Observation::Increment(MetricFamily::DeploymentsTotal, labels.clone()),
        Observation::Set(MetricFamily::DeploymentsDuration, labels.clone(), duration_seconds),
        Observation::Add(MetricFamily::DeploymentsDurationSum, labels.clone(), duration_seconds),
    ])?;

    tracing::info!(
        endpoint = "github",
        environment = %event.deployment.environment,
        repository = %repo,
        status = %event.deployment_status.state,
        team = %team,
        sha = %sha,
        duration = duration_seconds,
        "deployment recorded"
    );

    Ok(DeploymentRecord {
        labels,
        lead_time,
        duration_seconds,
    })
}

/// `POST /api/github`
pub async fn deployment_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<StatusCode, ApiError> {
    let event = headers
        .get(EVENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if event != DEPLOYMENT_STATUS_EVENT {
        tracing::debug!(endpoint = "github", %event, "event ignored");
        return Ok(StatusCode::ACCEPTED);
    }

    let payload = DeploymentStatusEvent::from_slice(&body).map_err(|e| {
        tracing::error!(endpoint = "github", error = %e, "rejecting event");
        e
    })?;

    ingest(&state, &payload, Utc::now()).await?;
    Ok(StatusCode::OK)
}
