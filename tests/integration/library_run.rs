use chrono::{TimeZone, Utc};
use jira_window_report::config::ReportConfig;
use jira_window_report::deliver::OutboxSink;
use jira_window_report::jira::FileIssueSource;
use jira_window_report::query::{build_union_query, QueryBounds};
use jira_window_report::runner::{run_report, OutcomeStatus, RunOptions};
use test_support::{init_tracing, read_fixture_json, read_fixture_text, tempdir};

#[test]
fn fixture_run_through_the_library() {
  init_tracing();
  let cfg = ReportConfig::from_json_str(&read_fixture_text("config.json")).unwrap();
  let source = FileIssueSource::from_value(read_fixture_json::<serde_json::Value>("issues.json")).unwrap();
  let td = tempdir();
  let sink = OutboxSink::new(td.path()).unwrap();
  let now = Utc.with_ymd_and_hms(2025, 11, 10, 7, 0, 0).single().unwrap();
  let opts = RunOptions {
    only_projects: Vec::new(),
    browse_base: Some("https://acme.atlassian.net".into()),
  };

  let run = run_report(&cfg, now, &source, &sink, &opts).unwrap();
  assert_eq!(run.generated_at, "2025-11-10T07:00:00Z");
  assert_eq!(run.failures(), 0);
  assert!(run.projects.iter().all(|p| p.status == OutcomeStatus::Delivered));

  let html = std::fs::read_to_string(td.path().join("SUP").join("message.html")).unwrap();
  assert!(html.contains("https://acme.atlassian.net/browse/SUP-3"));
}

#[test]
fn rolling_query_snapshot() {
  let end = chrono::NaiveDate::from_ymd_opt(2025, 11, 9).unwrap();
  let q = build_union_query("SUP", &QueryBounds::rolling(7, end), "priority = High").unwrap();
  insta::assert_snapshot!(
    q,
    @r#"project = "SUP" AND ( (created >= startOfDay(-7d)) OR (resolved >= startOfDay(-7d) AND resolved IS NOT EMPTY) OR (created < "2025-11-10" AND (resolved IS EMPTY OR resolved >= "2025-11-10")) ) AND priority = High"#
  );
}
