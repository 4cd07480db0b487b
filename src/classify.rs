// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Tag each fetched issue against an inclusive [start, end] day window and aggregate backlog accounting counts
// role: core/classifier
// inputs: Vec<IssueRecord> from one union query, start and end calendar days
// outputs: Tagged { rows, counts }
// side_effects: none
// invariants:
// - all comparisons are by calendar day (timestamps truncated to YYYY-MM-DD)
// - open_end == open_start + created - resolved for issues whose resolution (if any) is dated on or after creation
// - issue keys are unique; duplicates are rejected, never merged
// errors: ValidationError on start > end or duplicate keys
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::issue::IssueRecord;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedRow {
  pub key: String,
  pub fields: IssueRecord,
  pub created_in_window: bool,
  pub resolved_in_window: bool,
  pub open_at_start: bool,
  pub open_at_end: bool,
}

impl TaggedRow {
  /// True when the issue belongs in the report at all.
  pub fn matched(&self) -> bool {
    self.created_in_window || self.resolved_in_window || self.open_at_end
  }

  pub fn tags(&self) -> Vec<&'static str> {
    let mut out = Vec::new();
    if self.open_at_start {
      out.push("Open@Start");
    }
    if self.created_in_window {
      out.push("Created");
    }
    if self.resolved_in_window {
      out.push("Resolved");
    }
    if self.open_at_end {
      out.push("Open@End");
    }
    out
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
  pub created: usize,
  pub resolved: usize,
  pub open_start: usize,
  pub open_end: usize,
}

impl Counts {
  /// `open_end - (open_start + created - resolved)`; zero when the books balance.
  pub fn identity_delta(&self) -> i64 {
    self.open_end as i64 - (self.open_start as i64 + self.created as i64 - self.resolved as i64)
  }

  pub fn identity_holds(&self) -> bool {
    self.identity_delta() == 0
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tagged {
  pub rows: Vec<TaggedRow>,
  pub counts: Counts,
}

impl Tagged {
  pub fn matched_rows(&self) -> impl Iterator<Item = &TaggedRow> {
    self.rows.iter().filter(|r| r.matched())
  }
}

fn tag_one(issue: IssueRecord, start: NaiveDate, end: NaiveDate) -> TaggedRow {
  let created = issue.created_day();
  let resolved = issue.resolved_day();
  let has_res = issue.has_resolution();

  let created_in_window = created.is_some_and(|c| start <= c && c <= end);
  let resolved_in_window = has_res && resolved.is_some_and(|r| start <= r && r <= end);
  let open_at_start = created.is_some_and(|c| c < start) && (!has_res || resolved.is_some_and(|r| r >= start));
  let open_at_end = created.is_some_and(|c| c <= end) && (!has_res || resolved.is_some_and(|r| r > end));

  TaggedRow {
    key: issue.key.clone(),
    fields: issue,
    created_in_window,
    resolved_in_window,
    open_at_start,
    open_at_end,
  }
}

/// Tag one deduplicated issue list against `[start, end]`.
pub fn tag(issues: Vec<IssueRecord>, start: NaiveDate, end: NaiveDate) -> Result<Tagged> {
  if start > end {
    return Err(ReportError::validation(format!("window start {start} is after end {end}")));
  }

  let mut seen: HashSet<String> = HashSet::with_capacity(issues.len());
  for issue in &issues {
    if !seen.insert(issue.key.clone()) {
      return Err(ReportError::validation(format!("duplicate issue key {} in classifier input", issue.key)));
    }
  }

  let mut counts = Counts::default();
  let rows: Vec<TaggedRow> = issues
    .into_iter()
    .map(|issue| {
      let row = tag_one(issue, start, end);
      counts.created += row.created_in_window as usize;
      counts.resolved += row.resolved_in_window as usize;
      counts.open_start += row.open_at_start as usize;
      counts.open_end += row.open_at_end as usize;
      row
    })
    .collect();

  Ok(Tagged { rows, counts })
}
