use serde::{Deserialize, Serialize};

use crate::classify::{Counts, Tagged, TaggedRow};
use crate::error::Result;
use crate::issue::day_of;

#[derive(Clone, Debug, Default)]
pub struct RenderOptions {
  pub show_top_n: usize,
  pub include_csv: bool,
  /// Tracker base URL for issue links; `None` renders plain keys.
  pub browse_base: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvAttachment {
  pub name: String,
  #[serde(skip)]
  pub bytes: Vec<u8>,
}

/// Everything the delivery side needs for one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportArtifact {
  pub project_key: String,
  pub subject: String,
  pub html: String,
  pub csv: Option<CsvAttachment>,
}

fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for ch in s.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      c => out.push(c),
    }
  }
  out
}

/// File-name friendly form of a window label.
pub fn label_slug(label: &str) -> String {
  let mut out = String::with_capacity(label.len());
  for ch in label.chars() {
    if ch.is_ascii_alphanumeric() || ch == '-' {
      out.push(ch);
    } else if !out.ends_with('_') {
      out.push('_');
    }
  }
  out.trim_matches('_').to_string()
}

fn day_text(ts: Option<&str>) -> String {
  day_of(ts).map(|d| d.to_string()).unwrap_or_default()
}

fn or_dash(s: String) -> String {
  if s.is_empty() {
    "—".to_string()
  } else {
    s
  }
}

fn tile(title: &str, value: usize) -> String {
  format!(
    "<div style=\"padding:12px;border:1px solid #ddd;border-radius:8px;\"><b>{title}</b><div style=\"font-size:28px;\">{value}</div></div>"
  )
}

fn table(rows: &[&TaggedRow], title: &str, browse_base: Option<&str>) -> String {
  if rows.is_empty() {
    return format!("<h3>{}</h3><p>No issues.</p>", escape_html(title));
  }

  let mut body = String::new();
  for row in rows {
    let f = &row.fields;
    let key = escape_html(&row.key);
    let key_cell = match browse_base {
      Some(base) => format!("<a href='{}/browse/{key}'>{key}</a>", escape_html(base.trim_end_matches('/'))),
      None => key,
    };
    let tags = row.tags().join(", ");
    body.push_str(&format!(
      "<tr><td>{key_cell}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
      escape_html(&f.summary),
      escape_html(&or_dash(f.status.clone().unwrap_or_default())),
      escape_html(&or_dash(f.assignee.clone().unwrap_or_default())),
      or_dash(day_text(f.created.as_deref())),
      or_dash(day_text(f.resolution_date.as_deref())),
      or_dash(tags),
    ));
  }

  format!(
    "<h3>{}</h3><table border='1' cellpadding='6' cellspacing='0' style='border-collapse:collapse'>\
<thead><tr><th>Key</th><th>Summary</th><th>Status</th><th>Assignee</th><th>Created</th><th>Resolved</th><th>Tags</th></tr></thead>\
<tbody>{body}</tbody></table>",
    escape_html(title)
  )
}

pub fn render_html(project_key: &str, label: &str, counts: &Counts, rows: &[&TaggedRow], opts: &RenderOptions) -> String {
  let top_n = opts.show_top_n.max(1);
  let shown: Vec<&TaggedRow> = rows.iter().take(top_n).copied().collect();
  let title = format!("Top {} issues matched in this window", shown.len());

  format!(
    "<html><body style=\"font-family:Arial,Helvetica,sans-serif\">\
<h2>Jira Report — Project {} — {}</h2>\
<div style=\"display:flex;gap:16px;margin:10px 0;\">{}{}{}{}</div>\
{}\
<p style=\"color:#777;margin-top:16px;\">Flags: Open@Start = open when the window began; Created = created in window; \
Resolved = resolution set in window; Open@End = still open at the end of the window.</p>\
</body></html>",
    escape_html(project_key),
    escape_html(label),
    tile("Open (at start)", counts.open_start),
    tile("Created (in window)", counts.created),
    tile("Resolved (in window)", counts.resolved),
    tile("Open (at end)", counts.open_end),
    table(&shown, &title, opts.browse_base.as_deref()),
  )
}

/// CSV of the given rows, ordered by status (case-insensitive) then key.
pub fn render_csv(rows: &[&TaggedRow]) -> Result<Vec<u8>> {
  let mut sorted: Vec<&TaggedRow> = rows.to_vec();
  sorted.sort_by_key(|r| {
    (
      r.fields.status.clone().unwrap_or_default().to_lowercase(),
      r.key.to_lowercase(),
    )
  });

  let flag = |b: bool| if b { "1" } else { "0" };
  let mut w = csv::Writer::from_writer(Vec::new());
  w.write_record([
    "Key",
    "Summary",
    "Status",
    "Assignee",
    "Created",
    "Resolved",
    "Open_at_start",
    "Created_in_window",
    "Resolved_in_window",
    "Open_at_end",
  ])?;
  for r in sorted {
    let f = &r.fields;
    let created = day_text(f.created.as_deref());
    let resolved = day_text(f.resolution_date.as_deref());
    w.write_record([
      r.key.as_str(),
      f.summary.as_str(),
      f.status.as_deref().unwrap_or(""),
      f.assignee.as_deref().unwrap_or(""),
      created.as_str(),
      resolved.as_str(),
      flag(r.open_at_start),
      flag(r.created_in_window),
      flag(r.resolved_in_window),
      flag(r.open_at_end),
    ])?;
  }

  w.into_inner().map_err(|e| csv::Error::from(e.into_error()).into())
}

/// Assemble the per-project message. Only rows with at least one window flag are included.
pub fn assemble_report(project_key: &str, label: &str, tagged: &Tagged, opts: &RenderOptions) -> Result<ReportArtifact> {
  let rows: Vec<&TaggedRow> = tagged.matched_rows().collect();

  let html = render_html(project_key, label, &tagged.counts, &rows, opts);
  let csv = if opts.include_csv {
    Some(CsvAttachment {
      name: format!("{}_report_{}.csv", label_slug(project_key), label_slug(label)),
      bytes: render_csv(&rows)?,
    })
  } else {
    None
  };

  Ok(ReportArtifact {
    project_key: project_key.to_string(),
    subject: format!("Jira Report - {project_key} - {label}"),
    html,
    csv,
  })
}

/// Outbox folder of the failure notice; no project may slug to it.
pub const ALERT_FOLDER: &str = "ALERTS";

/// Failure notice for the operator address: one line per project that did not go out.
pub fn assemble_alert(label: &str, failures: &[(String, String)]) -> ReportArtifact {
  let items: String = failures
    .iter()
    .map(|(key, err)| format!("<li><b>{}</b>: {}</li>", escape_html(key), escape_html(err)))
    .collect();

  ReportArtifact {
    project_key: ALERT_FOLDER.to_string(),
    subject: format!("Jira Report failures - {} project(s) - {label}", failures.len()),
    html: format!(
      "<html><body style=\"font-family:Arial,Helvetica,sans-serif\"><h2>Jira Report failures — {}</h2><ul>{items}</ul></body></html>",
      escape_html(label)
    ),
    csv: None,
  }
}
