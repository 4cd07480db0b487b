use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::jira::FetchSettings;
use crate::query::{build_global_filter, combine_filters};
use crate::render::{label_slug, ALERT_FOLDER};
use crate::window::WindowConfig;

fn default_top_n() -> usize {
  20
}

fn default_true() -> bool {
  true
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
  #[serde(default, alias = "timezone")]
  pub timezone_label: Option<String>,
  pub window: WindowConfig,
  #[serde(default = "default_top_n")]
  pub show_top_n: usize,
  #[serde(default = "default_true")]
  pub include_csv_attachment: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub alerts_email: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalFilters {
  #[serde(default)]
  pub issue_types: Vec<String>,
  #[serde(default)]
  pub priorities: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
  pub key: String,
  #[serde(alias = "recipient")]
  pub lead_email: String,
  #[serde(default, alias = "extra_filter", skip_serializing_if = "Option::is_none")]
  pub jql_extra: Option<String>,
}

/// The run document authored by the configuration tool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
  pub report: ReportSection,
  #[serde(default)]
  pub global_jql_extra: String,
  #[serde(default)]
  pub filters: GlobalFilters,
  #[serde(default)]
  pub fetch: FetchSettings,
  #[serde(default)]
  pub projects: Vec<ProjectEntry>,
}

impl ReportConfig {
  pub fn from_json_str(s: &str) -> Result<Self> {
    let cfg: ReportConfig =
      serde_json::from_str(s).map_err(|e| ReportError::config(format!("invalid run document: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
  }

  pub fn load(path: &Path) -> Result<Self> {
    let text = std::fs::read_to_string(path)
      .map_err(|e| ReportError::config(format!("reading config {}: {e}", path.display())))?;
    Self::from_json_str(&text).map_err(|e| match e {
      ReportError::Config(m) => ReportError::config(format!("{}: {m}", path.display())),
      other => other,
    })
  }

  fn validate(&self) -> Result<()> {
    for (i, p) in self.projects.iter().enumerate() {
      if p.key.trim().is_empty() {
        return Err(ReportError::config(format!("projects[{i}] has an empty key")));
      }
      if label_slug(&p.key).eq_ignore_ascii_case(ALERT_FOLDER) {
        return Err(ReportError::config(format!(
          "project key '{}' is reserved for the failure alert folder",
          p.key
        )));
      }
      if !p.lead_email.contains('@') {
        return Err(ReportError::config(format!(
          "project {} has no usable recipient address ('{}')",
          p.key, p.lead_email
        )));
      }
    }
    Ok(())
  }

  /// Window settings with the report timezone folded in.
  pub fn window_config(&self) -> WindowConfig {
    let mut w = self.report.window.clone();
    if w.timezone.is_none() {
      w.timezone = self.report.timezone_label.clone();
    }
    w
  }

  pub fn show_top_n(&self) -> usize {
    self.report.show_top_n.max(1)
  }

  pub fn alerts_email(&self) -> Option<&str> {
    self.report.alerts_email.as_deref().map(str::trim).filter(|s| !s.is_empty())
  }

  /// Global structured filters and free-form clause combined.
  pub fn global_filter(&self) -> String {
    build_global_filter(&self.filters.issue_types, &self.filters.priorities, &self.global_jql_extra)
  }

  /// Everything appended to a project's union query.
  pub fn extra_filter_for(&self, project: &ProjectEntry) -> String {
    let global = self.global_filter();
    combine_filters([global.as_str(), project.jql_extra.as_deref().unwrap_or("")])
  }
}
