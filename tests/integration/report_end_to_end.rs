use predicates::prelude::*;
use test_support::{fixture_path, report_cmd, tempdir};

fn run_into(out: &std::path::Path, extra: &[&str]) -> serde_json::Value {
  let config = fixture_path("config.json");
  let issues = fixture_path("issues.json");
  let out_s = out.to_string_lossy().to_string();
  let mut args = vec!["--config", config.as_str(), "--issues-file", issues.as_str(), "--out", out_s.as_str()];
  args.extend_from_slice(extra);

  let res = report_cmd().args(&args).output().unwrap();
  assert!(res.status.success(), "stderr: {}", String::from_utf8_lossy(&res.stderr));
  serde_json::from_slice(&res.stdout).expect("stdout JSON")
}

#[test]
fn full_run_writes_outbox_and_manifest() {
  let td = tempdir();
  let printed = run_into(td.path(), &[]);
  assert_eq!(printed["dir"], &*td.path().to_string_lossy());

  let manifest_path = std::path::PathBuf::from(printed["manifest"].as_str().unwrap());
  assert!(manifest_path.ends_with("manifest.json"));
  let manifest: serde_json::Value = serde_json::from_slice(&std::fs::read(&manifest_path).unwrap()).unwrap();

  assert_eq!(manifest["dry_run"], false);
  assert_eq!(manifest["window"]["label"], "2025-11-01 to 2025-11-07");

  let sup = &manifest["projects"][0];
  assert_eq!(sup["key"], "SUP");
  assert_eq!(sup["status"], "delivered");
  assert_eq!(sup["counts"]["created"], 2);
  assert_eq!(sup["counts"]["resolved"], 1);
  assert_eq!(sup["counts"]["open_start"], 1);
  assert_eq!(sup["counts"]["open_end"], 2);
  assert_eq!(sup["identity_holds"], true);

  let ops = &manifest["projects"][1];
  assert_eq!(ops["status"], "delivered");
  assert_eq!(ops["counts"]["open_start"], 1);
  assert_eq!(ops["counts"]["open_end"], 1);
  assert!(ops["query"].as_str().unwrap().ends_with(" ) AND labels = \"ops\""));
}

#[test]
fn csv_lists_matched_issues_sorted_by_status() {
  let td = tempdir();
  run_into(td.path(), &["--project", "SUP"]);

  let csv = std::fs::read_to_string(td.path().join("SUP").join("SUP_report_2025-11-01_to_2025-11-07.csv")).unwrap();
  let lines: Vec<&str> = csv.lines().collect();
  assert_eq!(
    lines,
    vec![
      "Key,Summary,Status,Assignee,Created,Resolved,Open_at_start,Created_in_window,Resolved_in_window,Open_at_end",
      "SUP-2,Export <csv> misses & column,Done,,2025-10-30,2025-11-02,1,0,1,0",
      "SUP-3,Typo in footer,Done,,2025-11-07,2025-11-08,0,1,0,1",
      "SUP-1,Login page returns 500,In Progress,Dana Reyes,2025-11-01,,0,1,0,1",
    ]
  );
  assert!(!td.path().join("OPS").exists());
}

#[test]
fn message_and_envelope_are_ready_for_relay() {
  let td = tempdir();
  run_into(td.path(), &[]);

  let html = std::fs::read_to_string(td.path().join("SUP").join("message.html")).unwrap();
  assert!(html.contains("Export &lt;csv&gt; misses &amp; column"));
  assert!(!html.contains("Closed long ago"));
  assert!(html.contains("SUP-1"));

  let envelope: serde_json::Value =
    serde_json::from_slice(&std::fs::read(td.path().join("SUP").join("envelope.json")).unwrap()).unwrap();
  assert_eq!(envelope["to"], "sup-lead@example.com");
  assert_eq!(envelope["subject"], "Jira Report - SUP - 2025-11-01 to 2025-11-07");
  assert_eq!(envelope["attachments"][0], "SUP_report_2025-11-01_to_2025-11-07.csv");
}

#[test]
fn live_mode_requires_credentials() {
  let td = tempdir();
  report_cmd()
    .args(["--config", &fixture_path("config.json"), "--out", &td.path().to_string_lossy()])
    .assert()
    .failure()
    .stderr(predicate::str::contains("JIRA_API_TOKEN"));
}
