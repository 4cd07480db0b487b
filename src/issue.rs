use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ext::serde_json::JsonFetch;

/// Canonical issue shape; every tracker schema variant is normalized into this.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
  pub key: String,
  #[serde(default)]
  pub summary: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub assignee: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub issue_type: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub priority: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub resolution: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub resolution_date: Option<String>,
}

/// Calendar day of an ISO-8601 timestamp (its first ten characters).
pub fn day_of(timestamp: Option<&str>) -> Option<NaiveDate> {
  let s = timestamp?.trim();
  let head = s.get(..10)?;
  NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

impl IssueRecord {
  /// Normalize a raw tracker issue (`{"key": .., "fields": {..}}`).
  ///
  /// Returns `None` when the payload carries no key.
  pub fn from_json(raw: &serde_json::Value) -> Option<IssueRecord> {
    let key = raw.fetch("key").text()?;

    let resolution_date = raw
      .fetch("fields.resolutiondate")
      .text()
      .or_else(|| raw.fetch("fields.resolved").text());

    let resolution = match raw.fetch("fields.resolution").value() {
      Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
      Some(serde_json::Value::Object(_)) => {
        Some(raw.fetch("fields.resolution.name").text().unwrap_or_else(|| "Resolved".to_string()))
      }
      _ => None,
    };

    Some(IssueRecord {
      key,
      summary: raw.fetch("fields.summary").text().unwrap_or_default(),
      status: raw.fetch("fields.status.name").text(),
      assignee: raw.fetch("fields.assignee.displayName").text(),
      issue_type: raw.fetch("fields.issuetype.name").text(),
      priority: raw.fetch("fields.priority.name").text(),
      created: raw.fetch("fields.created").text(),
      updated: raw.fetch("fields.updated").text(),
      resolution,
      resolution_date,
    })
  }

  pub fn created_day(&self) -> Option<NaiveDate> {
    day_of(self.created.as_deref())
  }

  pub fn resolved_day(&self) -> Option<NaiveDate> {
    day_of(self.resolution_date.as_deref())
  }

  /// Either signal counts: a resolution value or a resolution date.
  pub fn has_resolution(&self) -> bool {
    self.resolution.is_some() || self.resolution_date.is_some()
  }
}

/// Normalize a page of raw issues, skipping (and logging) keyless entries.
pub fn normalize_all(raw: &[serde_json::Value]) -> Vec<IssueRecord> {
  raw
    .iter()
    .filter_map(|item| {
      let rec = IssueRecord::from_json(item);
      if rec.is_none() {
        tracing::warn!("skipping issue payload without a key");
      }
      rec
    })
    .collect()
}
