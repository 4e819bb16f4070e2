//! The closed set of metric families the exporter maintains.
//!
//! Exposition names match the snapshot files written by earlier deployments,
//! so a restarted exporter keeps reading its own history.

/// Label schema shared by the deployment families.
pub const DEPLOYMENT_LABELS: [&str; 4] = ["environment", "repo", "status", "team"];
/// Label schema shared by the incident families.
pub const INCIDENT_LABELS: [&str; 2] = ["project", "team"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "counter" => Some(MetricKind::Counter),
            "gauge" => Some(MetricKind::Gauge),
            _ => None,
        }
    }
}

/// Variant order is the exposition order (sorted by exposition name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricFamily {
    DeploymentsDuration,
    DeploymentsDurationSum,
    DeploymentsTotal,
    Incidents,
    IncidentsDurationSum,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 5] = [
        MetricFamily::DeploymentsDuration,
        MetricFamily::DeploymentsDurationSum,
        MetricFamily::DeploymentsTotal,
        MetricFamily::Incidents,
        MetricFamily::IncidentsDurationSum,
    ];

    /// Name as written to the exposition text.
    pub fn name(self) -> &'static str {
        match self {
            MetricFamily::DeploymentsDuration => "github_deployments_duration",
            MetricFamily::DeploymentsDurationSum => "github_deployments_duration_sum",
            MetricFamily::DeploymentsTotal => "github_deployments_total",
            MetricFamily::Incidents => "jira_incidents",
            MetricFamily::IncidentsDurationSum => "jira_incidents_duration_sum",
        }
    }

    /// Closed mapping from exposition name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn kind(self) -> MetricKind {
        match self {
            MetricFamily::DeploymentsTotal | MetricFamily::Incidents => MetricKind::Counter,
            MetricFamily::DeploymentsDuration
            | MetricFamily::DeploymentsDurationSum
            | MetricFamily::IncidentsDurationSum => MetricKind::Gauge,
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            MetricFamily::DeploymentsDuration => "The last deployments duration",
            MetricFamily::DeploymentsDurationSum => "The last deployments duration sum",
            MetricFamily::DeploymentsTotal => "The amount of successful deployments.",
            MetricFamily::Incidents => "The amount of incidents.",
            MetricFamily::IncidentsDurationSum => "The incidents duration sum.",
        }
    }

    /// Sorted label names every series of this family must carry.
    pub fn label_names(self) -> &'static [&'static str] {
        match self {
            MetricFamily::DeploymentsDuration
            | MetricFamily::DeploymentsDurationSum
            | MetricFamily::DeploymentsTotal => &DEPLOYMENT_LABELS,
            MetricFamily::Incidents | MetricFamily::IncidentsDurationSum => &INCIDENT_LABELS,
        }
    }
}

impl std::fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
