#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use chrono::{TimeZone, Utc};

use dora_core::metric::family::{DEPLOYMENT_LABELS, INCIDENT_LABELS};
use dora_core::model::{pull_request_reference, CommitRef, PullRequestRef};
use dora_core::{DoraError, LabelSet, MetricFamily, MetricKind};

#[test]
fn pull_request_reference_examples() {
    let cases = [
        ("PAY-2669 Introduce multi language for Debtor Reimbursement (#1786)", Some(1786)),
        ("Merge pull request #1 from mprokopov/restructure", Some(1)),
        ("Merge pull request from mprokopov/restructure", None),
        ("Revert #12, reapply #13", Some(12)),
        ("BETA-136: ticket notification log no exception (#12)", Some(12)),
        ("# heading without digits", None),
    ];
    for (message, want) in cases {
        assert_eq!(pull_request_reference(message), want, "{message}");
    }
}

#[test]
fn first_commit_is_first_in_api_order() {
    let at = |h| Utc.with_ymd_and_hms(2022, 9, 15, h, 0, 0).unwrap();
    let commit = |sha: &str, h| CommitRef {
        repository: "org/svc".into(),
        sha: sha.into(),
        authored_at: at(h),
        message: "wip".into(),
    };
    let pr = PullRequestRef {
        repository: "org/svc".into(),
        number: 42,
        commits: vec![commit("b", 7), commit("a", 5)],
    };
    assert_eq!(pr.first_commit().unwrap().sha, "b");

    let empty = PullRequestRef { commits: vec![], ..pr };
    assert!(empty.first_commit().is_none());
}

#[test]
fn family_mapping_is_closed() {
    for family in MetricFamily::ALL {
        assert_eq!(MetricFamily::from_name(family.name()), Some(family));
    }
    assert_eq!(MetricFamily::from_name("jira_incidents_total"), None);
    assert_eq!(MetricFamily::from_name("process_start_time_seconds"), None);

    assert_eq!(MetricFamily::DeploymentsTotal.kind(), MetricKind::Counter);
    assert_eq!(MetricFamily::Incidents.kind(), MetricKind::Counter);
    assert_eq!(MetricFamily::DeploymentsDuration.kind(), MetricKind::Gauge);

    let mut names: Vec<&str> = MetricFamily::ALL.iter().map(|f| f.name()).collect();
    names.sort();
    let ordered: Vec<&str> = MetricFamily::ALL.iter().map(|f| f.name()).collect();
    assert_eq!(names, ordered);
}

#[test]
fn label_schema_check() {
    let deploy: LabelSet = DEPLOYMENT_LABELS.iter().map(|k| (*k, "x")).collect();
    assert!(deploy.conforms_to(MetricFamily::DeploymentsTotal).is_ok());
    assert!(matches!(
        deploy.conforms_to(MetricFamily::Incidents),
        Err(DoraError::LabelSchema { .. })
    ));

    let incident: LabelSet = INCIDENT_LABELS.iter().map(|k| (*k, "x")).collect();
    assert!(incident.conforms_to(MetricFamily::IncidentsDurationSum).is_ok());
    assert!(incident
        .clone()
        .with("extra", "y")
        .conforms_to(MetricFamily::Incidents)
        .is_err());
}

#[test]
fn label_sets_compare_by_content() {
    let a = LabelSet::new().with("team", "A").with("project", "P");
    let b = LabelSet::new().with("project", "P").with("team", "A");
    assert_eq!(a, b);
    assert_ne!(a, b.with("team", "B"));
}
