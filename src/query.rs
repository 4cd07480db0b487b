// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Build the single union JQL that fetches created-in-window, resolved-in-window and open-at-end issues at once
// role: core/query
// inputs: project key, QueryBounds (absolute start/end or duration + end), extra filter clause
// outputs: JQL string
// side_effects: none
// invariants:
// - exactly one of (start, interval) is set; end is always set
// - inclusive end boundaries are expressed as `< end+1 day`, computed on dates never on strings
// - the open-at-end term always anchors to the absolute end
// - extra filters keep a caller-supplied leading AND/OR, otherwise gain `AND`
// errors: ValidationError for missing/ambiguous bounds, empty project key, start after end
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ReportError, Result};
use crate::window::{next_day, ResolvedWindow};

static RE_CONNECTOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(and|or)\s").unwrap());

/// Date bounds handed to the builder.
///
/// Either `start` (absolute) or `interval_days` (relative) drives the
/// created/resolved terms; `end` is required in both cases.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct QueryBounds {
  pub start: Option<NaiveDate>,
  pub end: Option<NaiveDate>,
  pub interval_days: Option<u32>,
}

impl QueryBounds {
  pub fn absolute(start: NaiveDate, end: NaiveDate) -> Self {
    Self {
      start: Some(start),
      end: Some(end),
      interval_days: None,
    }
  }

  pub fn rolling(interval_days: u32, end: NaiveDate) -> Self {
    Self {
      start: None,
      end: Some(end),
      interval_days: Some(interval_days),
    }
  }
}

impl From<&ResolvedWindow> for QueryBounds {
  fn from(w: &ResolvedWindow) -> Self {
    match w.interval_days {
      Some(n) => QueryBounds::rolling(n, w.end),
      None => QueryBounds::absolute(w.start, w.end),
    }
  }
}

/// Quote a JQL string literal.
pub fn jql_quote(value: &str) -> String {
  let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
  format!("\"{escaped}\"")
}

fn quote_day(day: NaiveDate) -> String {
  jql_quote(&day.format("%Y-%m-%d").to_string())
}

/// Normalize an extra clause for appending: blank → "", leading AND/OR kept, otherwise ` AND ` prefix.
pub fn merge_filters(extra: &str) -> String {
  let f = extra.trim();
  if f.is_empty() {
    return String::new();
  }
  if RE_CONNECTOR.is_match(f) {
    format!(" {f}")
  } else {
    format!(" AND {f}")
  }
}

/// Join several extra clauses (global, structured, per-project) into one.
pub fn combine_filters<'a, I>(clauses: I) -> String
where
  I: IntoIterator<Item = &'a str>,
{
  clauses
    .into_iter()
    .map(merge_filters)
    .collect::<String>()
    .trim()
    .to_string()
}

/// Compile structured selections into a clause, e.g. `AND issuetype in ("Bug") AND priority in ("High")`.
pub fn build_global_filter(issue_types: &[String], priorities: &[String], freeform: &str) -> String {
  let list = |values: &[String]| values.iter().map(|v| jql_quote(v)).collect::<Vec<_>>().join(", ");

  let mut parts: Vec<String> = Vec::new();
  if !issue_types.is_empty() {
    parts.push(format!("AND issuetype in ({})", list(issue_types)));
  }
  if !priorities.is_empty() {
    parts.push(format!("AND priority in ({})", list(priorities)));
  }
  let rest = merge_filters(freeform);
  if !rest.is_empty() {
    parts.push(rest.trim().to_string());
  }
  parts.join(" ")
}

/// Build the union query for one project.
pub fn build_union_query(project_key: &str, bounds: &QueryBounds, extra: &str) -> Result<String> {
  let key = project_key.trim();
  if key.is_empty() {
    return Err(ReportError::validation("project key must not be empty"));
  }

  let end = bounds.end.ok_or_else(|| {
    ReportError::validation("an absolute 'end' date is required for the open-as-of-end clause")
  })?;
  let end_next = quote_day(next_day(end));

  let (created_term, resolved_term) = match (bounds.start, bounds.interval_days) {
    (Some(_), Some(_)) => {
      return Err(ReportError::validation(
        "provide either 'start' or an interval, not both; an interval only pairs with 'end'",
      ));
    }
    (None, None) => {
      return Err(ReportError::validation("either 'start' and 'end' or an interval with 'end' is required"));
    }
    (Some(start), None) => {
      if start > end {
        return Err(ReportError::validation(format!("query start {start} is after end {end}")));
      }
      let start_q = quote_day(start);
      (
        format!("(created >= {start_q} AND created < {end_next})"),
        format!("(resolved >= {start_q} AND resolved < {end_next} AND resolved IS NOT EMPTY)"),
      )
    }
    (None, Some(n)) => {
      if n == 0 {
        return Err(ReportError::validation("interval must be at least one day"));
      }
      (
        format!("(created >= startOfDay(-{n}d))"),
        format!("(resolved >= startOfDay(-{n}d) AND resolved IS NOT EMPTY)"),
      )
    }
  };
  let open_term = format!("(created < {end_next} AND (resolved IS EMPTY OR resolved >= {end_next}))");

  let filters = merge_filters(extra);
  Ok(format!(
    "project = {} AND ( {created_term} OR {resolved_term} OR {open_term} ){filters}",
    jql_quote(key)
  ))
}

/// Convenience wrapper over a resolved window.
pub fn build_for_window(project_key: &str, window: &ResolvedWindow, extra: &str) -> Result<String> {
  build_union_query(project_key, &QueryBounds::from(window), extra)
}
