use std::path::Path;

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jira_window_report::config::ReportConfig;
use jira_window_report::deliver::OutboxSink;
use jira_window_report::jira::{FileIssueSource, IssueSource, JiraClient};
use jira_window_report::manifest::write_run_manifest;
use jira_window_report::runner::{plan_run, run_report, RunOptions};
use jira_window_report::util;
use jira_window_report::window::parse_now_override;

mod cli;

use crate::cli::{connection_from_env, normalize, Cli};

fn init_logging(default_level: &str) {
  let filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(default_level))
    .unwrap_or_else(|_| EnvFilter::new("info"));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .try_init();
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  init_logging(&cli.log_level);

  // Phase 1: normalize CLI and load the run document
  let eff = normalize(cli)?;
  let cfg = ReportConfig::load(Path::new(&eff.config))?;

  // Phase 2: pin "now" for the whole run
  let now_opt = parse_now_override(eff.now_override.as_deref());
  if eff.now_override.is_some() && now_opt.is_none() {
    bail!("--now-override must be RFC3339, got {:?}", eff.now_override.as_deref().unwrap_or_default());
  }
  let now = util::effective_now(now_opt);

  let mut opts = RunOptions {
    only_projects: eff.projects.clone(),
    browse_base: None,
  };

  if eff.dry_run {
    let plan = plan_run(&cfg, now, &opts)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    return Ok(());
  }

  // Phase 3: pick the issue source
  let source: Box<dyn IssueSource> = match eff.issues_file.as_deref() {
    Some(path) => Box::new(FileIssueSource::load(Path::new(path))?),
    None => {
      let conn = connection_from_env()?;
      opts.browse_base = Some(conn.base_url.clone());
      Box::new(JiraClient::new(conn, cfg.fetch.clone()))
    }
  };

  // Phase 4: run every project into the outbox
  let dir = util::prepare_out_dir(&eff.out, now)?;
  let sink = OutboxSink::new(&dir)?;
  let summary = run_report(&cfg, now, source.as_ref(), &sink, &opts)?;
  let manifest = write_run_manifest(&dir, &summary)?;

  println!(
    "{}",
    serde_json::json!({
      "dir": dir.to_string_lossy(),
      "manifest": manifest.to_string_lossy(),
    })
  );

  let failed = summary.failures();
  if failed > 0 {
    bail!("{failed} of {} project(s) failed; see {}", summary.projects.len(), manifest.display());
  }
  Ok(())
}
