use test_support::report_cmd;

#[test]
fn cli_generates_man_page() {
  let out = report_cmd().args(["--gen-man"]).output().unwrap();
  assert!(out.status.success());
  let s = String::from_utf8_lossy(&out.stdout);
  assert!(s.contains(".TH"));
  assert!(s.contains("jira-window-report"));
}
