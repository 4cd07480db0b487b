use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use jira_window_report::jira::JiraConnection;
use jira_window_report::util;

#[derive(Parser, Debug)]
#[command(
    name = "jira-window-report",
    version,
    about = "Per-project Jira reports: issues open at start, created, resolved and open at end of a window",
    long_about = None
)]
pub struct Cli {
  /// Path to the JSON run document (report settings, filters, projects)
  #[arg(long)]
  pub config: Option<PathBuf>,

  /// Outbox directory for messages, attachments and manifest.json (default: auto-named temp dir)
  #[arg(long, default_value = "-")]
  pub out: String,

  /// Only report these project keys (repeatable)
  #[arg(long = "project")]
  pub projects: Vec<String>,

  /// Resolve the window and print the per-project queries without fetching
  #[arg(long)]
  pub dry_run: bool,

  /// Read issues from a JSON file (project key -> raw issue array) instead of Jira
  #[arg(long)]
  pub issues_file: Option<PathBuf>,

  /// Default log filter when RUST_LOG is unset
  #[arg(long, default_value = "info")]
  pub log_level: String,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,

  /// Override the "now" instant used to resolve the window (hidden; tests only)
  #[arg(long = "now-override", hide = true)]
  pub now_override: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EffectiveConfig {
  pub config: String, // absolute path for stability
  pub out: String,
  pub projects: Vec<String>,
  pub dry_run: bool,
  pub issues_file: Option<String>,
  pub now_override: Option<String>,
}

pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  let Some(config) = cli.config.as_ref() else {
    bail!("Provide --config <path> to a run document");
  };

  let projects: Vec<String> = cli
    .projects
    .iter()
    .map(|p| p.trim().to_string())
    .filter(|p| !p.is_empty())
    .collect();

  Ok(EffectiveConfig {
    config: util::canonicalize_lossy(config),
    out: cli.out,
    projects,
    dry_run: cli.dry_run,
    issues_file: cli.issues_file.as_deref().map(util::canonicalize_lossy),
    now_override: cli.now_override.clone(),
  })
}

/// Tracker connection from JIRA_BASE_URL, JIRA_EMAIL and JIRA_API_TOKEN.
pub fn connection_from_env() -> Result<JiraConnection> {
  let var = |name: &str| std::env::var(name).unwrap_or_default();
  JiraConnection::new(&var("JIRA_BASE_URL"), &var("JIRA_EMAIL"), &var("JIRA_API_TOKEN"))
    .context("Jira connection (set JIRA_BASE_URL, JIRA_EMAIL, JIRA_API_TOKEN)")
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  fn base_cli() -> Cli {
    Cli {
      config: Some(PathBuf::from("config.json")),
      out: "-".into(),
      projects: Vec::new(),
      dry_run: false,
      issues_file: None,
      log_level: "info".into(),
      gen_man: false,
      now_override: None,
    }
  }

  #[test]
  fn normalize_requires_config() {
    let mut cli = base_cli();
    cli.config = None;
    assert!(normalize(cli).is_err());
  }

  #[test]
  fn normalize_trims_projects_and_absolutizes_paths() {
    let mut cli = base_cli();
    cli.projects = vec![" SUP ".into(), "".into(), "OPS".into()];
    cli.issues_file = Some(PathBuf::from("issues.json"));
    let cfg = normalize(cli).unwrap();
    assert_eq!(cfg.projects, vec!["SUP", "OPS"]);
    assert!(cfg.config.starts_with('/'));
    assert!(cfg.issues_file.as_deref().unwrap().ends_with("issues.json"));
    assert!(!cfg.dry_run);
  }

  #[test]
  fn parses_repeatable_project_flag() {
    let cli = Cli::try_parse_from([
      "jira-window-report",
      "--config",
      "c.json",
      "--project",
      "SUP",
      "--project",
      "OPS",
      "--dry-run",
    ])
    .unwrap();
    assert_eq!(cli.projects, vec!["SUP", "OPS"]);
    assert!(cli.dry_run);
    assert_eq!(cli.out, "-");
  }

  #[test]
  #[serial]
  fn connection_from_env_reads_vars() {
    {
      let _env = test_support::with_env(&[
        ("JIRA_BASE_URL", Some("https://acme.atlassian.net/")),
        ("JIRA_EMAIL", Some("bot@acme.test")),
        ("JIRA_API_TOKEN", Some("tok")),
      ]);
      let conn = connection_from_env().unwrap();
      assert_eq!(conn.base_url, "https://acme.atlassian.net");
      assert_eq!(conn.browse_url("SUP-1"), "https://acme.atlassian.net/browse/SUP-1");
    }

    let _env = test_support::with_env(&[
      ("JIRA_BASE_URL", Some("https://acme.atlassian.net")),
      ("JIRA_EMAIL", Some("bot@acme.test")),
      ("JIRA_API_TOKEN", None),
    ]);
    let err = connection_from_env().unwrap_err();
    assert!(format!("{err:#}").contains("JIRA_API_TOKEN"));
  }
}
