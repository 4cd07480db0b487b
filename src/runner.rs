// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Orchestrate one report run: resolve the window once, then per project build query, fetch, tag, assemble, deliver
// role: processing/orchestrator
// inputs: ReportConfig, "now", IssueSource, ReportSink, RunOptions
// outputs: RunSummary with one ProjectOutcome per selected project
// side_effects: Network via IssueSource; files via ReportSink; logs
// invariants:
// - window failure aborts the run (every project shares it); nothing falls back to a default window
// - a failing project is recorded as failed and the loop continues with the next one
// - dry runs never call the source or the sink
// errors: ConfigError/ValidationError from window resolution; per-project errors are captured in outcomes
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::{tag, Counts};
use crate::config::{ProjectEntry, ReportConfig};
use crate::deliver::ReportSink;
use crate::error::Result;
use crate::jira::IssueSource;
use crate::query::build_for_window;
use crate::render::{assemble_alert, assemble_report, RenderOptions};
use crate::window::{resolve, ResolvedWindow};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
  Planned,
  Delivered,
  Failed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectOutcome {
  pub key: String,
  pub recipient: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub query: Option<String>,
  pub status: OutcomeStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub counts: Option<Counts>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub identity_holds: Option<bool>,
  #[serde(default)]
  pub files: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl ProjectOutcome {
  fn new(project: &ProjectEntry) -> Self {
    Self {
      key: project.key.clone(),
      recipient: project.lead_email.clone(),
      query: None,
      status: OutcomeStatus::Planned,
      counts: None,
      identity_holds: None,
      files: Vec::new(),
      error: None,
    }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
  pub generated_at: String,
  pub window: ResolvedWindow,
  pub dry_run: bool,
  pub projects: Vec<ProjectOutcome>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub alert_files: Vec<String>,
}

impl RunSummary {
  pub fn failures(&self) -> usize {
    self.projects.iter().filter(|p| p.status == OutcomeStatus::Failed).count()
  }
}

#[derive(Clone, Debug, Default)]
pub struct RunOptions {
  /// Restrict the run to these keys (case-insensitive); empty means all.
  pub only_projects: Vec<String>,
  pub browse_base: Option<String>,
}

fn selected<'a>(cfg: &'a ReportConfig, opts: &RunOptions) -> Vec<&'a ProjectEntry> {
  cfg
    .projects
    .iter()
    .filter(|p| opts.only_projects.is_empty() || opts.only_projects.iter().any(|k| k.eq_ignore_ascii_case(&p.key)))
    .collect()
}

fn resolve_run_window(cfg: &ReportConfig, now: DateTime<Utc>) -> Result<ResolvedWindow> {
  let window = resolve(&cfg.window_config(), now)?;
  tracing::info!(start = %window.start, end = %window.end, mode = window.mode.as_str(), "resolved report window");
  Ok(window)
}

fn summary(now: DateTime<Utc>, window: ResolvedWindow, dry_run: bool, projects: Vec<ProjectOutcome>) -> RunSummary {
  RunSummary {
    generated_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
    window,
    dry_run,
    projects,
    alert_files: Vec::new(),
  }
}

/// Resolve the window and build every project's query without fetching anything.
pub fn plan_run(cfg: &ReportConfig, now: DateTime<Utc>, opts: &RunOptions) -> Result<RunSummary> {
  let window = resolve_run_window(cfg, now)?;

  let outcomes = selected(cfg, opts)
    .into_iter()
    .map(|project| {
      let mut outcome = ProjectOutcome::new(project);
      match build_for_window(&project.key, &window, &cfg.extra_filter_for(project)) {
        Ok(q) => outcome.query = Some(q),
        Err(e) => {
          outcome.status = OutcomeStatus::Failed;
          outcome.error = Some(e.to_string());
        }
      }
      outcome
    })
    .collect();

  Ok(summary(now, window, true, outcomes))
}

fn process_project(
  cfg: &ReportConfig,
  window: &ResolvedWindow,
  project: &ProjectEntry,
  source: &dyn IssueSource,
  sink: &dyn ReportSink,
  render_opts: &RenderOptions,
  outcome: &mut ProjectOutcome,
) -> Result<()> {
  let query = build_for_window(&project.key, window, &cfg.extra_filter_for(project))?;
  tracing::debug!(project = %project.key, %query, "built union query");
  outcome.query = Some(query.clone());

  let issues = source.fetch_issues(&project.key, &query)?;
  let tagged = tag(issues, window.start, window.end)?;
  let counts = tagged.counts;
  tracing::info!(
    project = %project.key,
    open_start = counts.open_start,
    created = counts.created,
    resolved = counts.resolved,
    open_end = counts.open_end,
    "classified issues"
  );
  if !counts.identity_holds() {
    tracing::warn!(
      project = %project.key,
      delta = counts.identity_delta(),
      "backlog identity does not balance; some issues have inconsistent resolution data"
    );
  }
  outcome.counts = Some(counts);
  outcome.identity_holds = Some(counts.identity_holds());

  let artifact = assemble_report(&project.key, &window.label, &tagged, render_opts)?;
  outcome.files = sink.deliver(&project.lead_email, &artifact)?;
  Ok(())
}

/// Full run: every selected project is fetched, classified and delivered independently.
pub fn run_report(
  cfg: &ReportConfig,
  now: DateTime<Utc>,
  source: &dyn IssueSource,
  sink: &dyn ReportSink,
  opts: &RunOptions,
) -> Result<RunSummary> {
  let window = resolve_run_window(cfg, now)?;
  let render_opts = RenderOptions {
    show_top_n: cfg.show_top_n(),
    include_csv: cfg.report.include_csv_attachment,
    browse_base: opts.browse_base.clone(),
  };

  let mut outcomes: Vec<ProjectOutcome> = Vec::new();
  for project in selected(cfg, opts) {
    let mut outcome = ProjectOutcome::new(project);
    match process_project(cfg, &window, project, source, sink, &render_opts, &mut outcome) {
      Ok(()) => outcome.status = OutcomeStatus::Delivered,
      Err(e) => {
        tracing::error!(project = %project.key, error = %e, "project failed; continuing with the next one");
        outcome.status = OutcomeStatus::Failed;
        outcome.error = Some(e.to_string());
      }
    }
    outcomes.push(outcome);
  }

  let mut run = summary(now, window, false, outcomes);

  if let Some(to) = cfg.alerts_email() {
    let failed: Vec<(String, String)> = run
      .projects
      .iter()
      .filter(|p| p.status == OutcomeStatus::Failed)
      .map(|p| (p.key.clone(), p.error.clone().unwrap_or_default()))
      .collect();
    if !failed.is_empty() {
      match sink.deliver(to, &assemble_alert(&run.window.label, &failed)) {
        Ok(files) => run.alert_files = files,
        Err(e) => tracing::error!(error = %e, "could not queue failure alert"),
      }
    }
  }

  Ok(run)
}
