use predicates::prelude::*;
use test_support::{fixture_path, report_cmd};

fn dry_run(extra: &[&str]) -> serde_json::Value {
  let config = fixture_path("config_last_week.json");
  let mut args = vec!["--config", config.as_str(), "--dry-run", "--now-override", "2025-11-12T09:00:00Z"];
  args.extend_from_slice(extra);

  let out = report_cmd().args(&args).output().unwrap();
  assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
  serde_json::from_slice(&out.stdout).expect("dry run prints JSON")
}

#[test]
fn last_week_resolves_previous_iso_week() {
  let plan = dry_run(&[]);
  assert_eq!(plan["dry_run"], true);
  assert_eq!(plan["window"]["mode"], "last_week");
  assert_eq!(plan["window"]["start"], "2025-11-03");
  assert_eq!(plan["window"]["end"], "2025-11-09");
  assert_eq!(plan["window"]["label"], "Last week 2025-W45 (2025-11-03 to 2025-11-09)");

  let projects = plan["projects"].as_array().unwrap();
  assert_eq!(projects.len(), 2);
  assert!(projects.iter().all(|p| p["status"] == "planned"));
  assert!(projects.iter().all(|p| p.get("counts").is_none()));
}

#[test]
fn plan_carries_union_query_with_filters() {
  let plan = dry_run(&["--project", "ops"]);
  let projects = plan["projects"].as_array().unwrap();
  assert_eq!(projects.len(), 1);
  assert_eq!(projects[0]["key"], "OPS");
  insta::assert_snapshot!(
    projects[0]["query"].as_str().unwrap(),
    @r#"project = "OPS" AND ( (created >= "2025-11-03" AND created < "2025-11-10") OR (resolved >= "2025-11-03" AND resolved < "2025-11-10" AND resolved IS NOT EMPTY) OR (created < "2025-11-10" AND (resolved IS EMPTY OR resolved >= "2025-11-10")) ) AND issuetype in ("Bug", "Task") AND component = "API" OR labels = "ops""#
  );
}

#[test]
fn inverted_window_fails_the_run() {
  report_cmd()
    .args(["--config", &fixture_path("config_inverted.json"), "--dry-run"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("validation error").and(predicate::str::contains("after end")));
}

#[test]
fn missing_config_is_an_error() {
  report_cmd()
    .args(["--dry-run"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("--config"));
}

#[test]
fn unparseable_now_override_is_rejected() {
  report_cmd()
    .args(["--config", &fixture_path("config_last_week.json"), "--dry-run", "--now-override", "next tuesday"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("--now-override"));
}
