//! Text exposition codec tests driven by `tests/vectors`.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]


use std::collections::BTreeMap;

use dora_core::protocol::{parse, render, DeclaredType};
use dora_core::{DoraError, LabelSet, MetricFamily, Snapshot};

fn type_name(t: DeclaredType) -> &'static str {
    match t {
        DeclaredType::Counter => "counter",
        DeclaredType::Gauge => "gauge",
        DeclaredType::Histogram => "histogram",
        DeclaredType::Summary => "summary",
        DeclaredType::Untyped => "untyped",
    }
}

fn deploy(env: &str) -> LabelSet {
    LabelSet::new()
        .with("environment", env)
        .with("repo", "org/svc")
        .with("status", "success")
        .with("team", "Payments")
}

#[test]
fn vectors() {
    for v in vector_loader::load_all() {
        let text = vector_loader::read(&v.file);
        let result = parse(&text);

        if let Some(want) = &v.expect_error {
            match result {
                Err(DoraError::SnapshotUnparsable { line, .. }) => {
                    assert_eq!(line, want.line, "{}", v.description)
                }
                other => panic!("{}: expected parse error, got {other:?}", v.description),
            }
            continue;
        }

        let want = v.expect.as_ref().expect("vector needs expect or expect_error");
        let families = result.unwrap_or_else(|e| panic!("{}: {e}", v.description));
        assert_eq!(families.len(), want.families.len(), "{}", v.description);
        for (got, want) in families.iter().zip(&want.families) {
            assert_eq!(got.name, want.name, "{}", v.description);
            assert_eq!(type_name(got.declared_type), want.declared_type, "{}", v.description);
            assert_eq!(got.samples.len(), want.samples, "{}: {}", v.description, got.name);
        }
    }
}

#[test]
fn legacy_snapshot_values() {
    let families = parse(&vector_loader::read("legacy_snapshot.prom")).unwrap();
    let total = families.iter().find(|f| f.name == "github_deployments_total").unwrap();
    assert_eq!(total.help.as_deref(), Some("The amount of successful deployments."));
    assert_eq!(total.samples[0].labels, deploy("prod"));
    assert_eq!(total.samples[0].value, 5.0);

    let sum = families.iter().find(|f| f.name == "github_deployments_duration_sum").unwrap();
    assert_eq!(sum.samples[0].value, 1_234_567.8);
}

#[test]
fn escapes_are_decoded() {
    let families = parse(&vector_loader::read("escaped_labels.prom")).unwrap();
    let f = &families[0];
    assert_eq!(f.help.as_deref(), Some("Incidents with a \\ backslash\nand newline."));
    assert_eq!(f.samples[0].labels.get("project"), Some("IN\"F"));
    assert_eq!(f.samples[0].labels.get("team"), Some("Team \\ One\nTwo"));
    assert_eq!(f.samples[1].labels.get("project"), Some("OPS"));
    assert_eq!(f.samples[1].timestamp_ms, Some(1_663_221_422_000));
}

#[test]
fn special_values_parse() {
    let families = parse(&vector_loader::read("special_values.prom")).unwrap();
    let values: Vec<f64> = families[0].samples.iter().map(|s| s.value).collect();
    assert_eq!(values[0], f64::INFINITY);
    assert_eq!(values[1], f64::NEG_INFINITY);
    assert!(values[2].is_nan());
    assert_eq!(values[3], -0.5);
}

#[test]
fn empty_snapshot_renders_empty() {
    assert_eq!(render(&Snapshot::default()), "");
    assert!(parse("").unwrap().is_empty());
}

#[test]
fn render_layout() {
    let mut series = BTreeMap::new();
    series.insert((MetricFamily::DeploymentsTotal, deploy("prod")), 6.0);
    series.insert(
        (
            MetricFamily::Incidents,
            LabelSet::new().with("project", "INF").with("team", "Quote \"q\""),
        ),
        1.0,
    );
    series.insert((MetricFamily::DeploymentsDuration, deploy("prod")), 12.5);

    let text = render(&Snapshot::new(series));
    let want = "\
# HELP github_deployments_duration The last deployments duration
# TYPE github_deployments_duration gauge
github_deployments_duration{environment=\"prod\",repo=\"org/svc\",status=\"success\",team=\"Payments\"} 12.5
# HELP github_deployments_total The amount of successful deployments.
# TYPE github_deployments_total counter
github_deployments_total{environment=\"prod\",repo=\"org/svc\",status=\"success\",team=\"Payments\"} 6
# HELP jira_incidents The amount of incidents.
# TYPE jira_incidents counter
jira_incidents{project=\"INF\",team=\"Quote \\\"q\\\"\"} 1
";
    assert_eq!(text, want);
}

#[test]
fn rendered_text_parses_back_to_the_same_values() {
    let mut series = BTreeMap::new();
    series.insert((MetricFamily::DeploymentsDurationSum, deploy("prod")), 0.1 + 0.2);
    series.insert((MetricFamily::DeploymentsDurationSum, deploy("dev")), 1e21);
    series.insert(
        (
            MetricFamily::IncidentsDurationSum,
            LabelSet::new().with("project", "PAY").with("team", "line\nbreak"),
        ),
        3_600.000_001,
    );
    let snapshot = Snapshot::new(series);

    let families = parse(&render(&snapshot)).unwrap();
    let mut decoded = BTreeMap::new();
    for f in families {
        let family = MetricFamily::from_name(&f.name).unwrap();
        for s in f.samples {
            decoded.insert((family, s.labels), s.value);
        }
    }
    assert_eq!(Snapshot::new(decoded), snapshot);
}
