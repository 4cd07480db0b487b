use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Duration, Local, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

// Window resolution: configuration → concrete inclusive calendar days.

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
  CustomRange,
  LastWeek,
  RollingDays,
}

impl WindowMode {
  pub fn as_str(&self) -> &'static str {
    match self {
      WindowMode::CustomRange => "custom_range",
      WindowMode::LastWeek => "last_week",
      WindowMode::RollingDays => "rolling_days",
    }
  }
}

impl FromStr for WindowMode {
  type Err = ReportError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "custom_range" => Ok(WindowMode::CustomRange),
      "last_week" => Ok(WindowMode::LastWeek),
      "rolling_days" => Ok(WindowMode::RollingDays),
      other => Err(ReportError::config(format!(
        "unrecognized window mode '{other}' (expected custom_range, last_week or rolling_days)"
      ))),
    }
  }
}

/// Window section of the run document, as authored.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
  #[serde(default)]
  pub mode: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub start: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub end: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rolling_days: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timezone: Option<String>,
}

/// Inclusive `[start, end]` calendar-day window.
///
/// `interval_days` is only set for rolling windows; the query builder then
/// expresses created/resolved terms as a relative duration while the
/// backlog snapshot still anchors to `end`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResolvedWindow {
  pub mode: WindowMode,
  pub start: NaiveDate,
  pub end: NaiveDate,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub interval_days: Option<u32>,
  pub label: String,
}

impl ResolvedWindow {
  pub fn contains(&self, day: NaiveDate) -> bool {
    self.start <= day && day <= self.end
  }

  /// First day after the window; used for strict less-than comparisons.
  pub fn end_exclusive(&self) -> NaiveDate {
    next_day(self.end)
  }

  pub fn days(&self) -> i64 {
    (self.end - self.start).num_days() + 1
  }
}

pub fn next_day(day: NaiveDate) -> NaiveDate {
  day.succ_opt().unwrap_or(NaiveDate::MAX)
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_day(raw: &str, what: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
    .map_err(|e| ReportError::validation(format!("invalid {what} date '{raw}': {e} (expected YYYY-MM-DD)")))
}

/// Today's calendar date in the named timezone.
///
/// Unknown names silently fall back to the system's local date.
pub fn today_in(timezone: Option<&str>, now: DateTime<Utc>) -> NaiveDate {
  let name = timezone.map(str::trim).unwrap_or("");

  if name.is_empty() || name.eq_ignore_ascii_case("local") {
    return now.with_timezone(&Local).date_naive();
  }

  if name.eq_ignore_ascii_case("utc") {
    return now.date_naive();
  }

  match name.parse::<Tz>() {
    Ok(zone) => now.with_timezone(&zone).date_naive(),
    Err(_) => {
      tracing::debug!(timezone = name, "unknown timezone; using local calendar date");
      now.with_timezone(&Local).date_naive()
    }
  }
}

/// Parse a `--now-override` value: RFC3339, or a naive `%Y-%m-%dT%H:%M:%S` read as UTC.
pub fn parse_now_override(s: Option<&str>) -> Option<DateTime<Utc>> {
  s.and_then(|raw| {
    DateTime::parse_from_rfc3339(raw)
      .ok()
      .map(|dt| dt.with_timezone(&Utc))
      .or_else(|| {
        chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
          .ok()
          .map(|ndt| ndt.and_utc())
      })
  })
}

fn start_of_week(day: NaiveDate) -> NaiveDate {
  day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

/// Previous Monday..Sunday relative to `today`.
fn last_week_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
  let start = start_of_week(today) - Duration::days(7);
  (start, start + Duration::days(6))
}

/// The `n` days immediately preceding `today`; never includes today.
///
/// `None` when the start would fall outside the representable calendar.
fn rolling_range(today: NaiveDate, n: u32) -> Option<(NaiveDate, NaiveDate)> {
  let start = today.checked_sub_days(Days::new(u64::from(n)))?;
  let end = today.checked_sub_days(Days::new(1))?;
  Some((start, end))
}

fn reject_extra(mode: WindowMode, present: &[(&str, bool)]) -> Result<()> {
  let extra: Vec<&str> = present.iter().filter(|(_, p)| *p).map(|(n, _)| *n).collect();
  if extra.is_empty() {
    Ok(())
  } else {
    Err(ReportError::config(format!(
      "window mode {} does not take: {}",
      mode.as_str(),
      extra.join(", ")
    )))
  }
}

/// Resolve a window configuration against `now`.
pub fn resolve(config: &WindowConfig, now: DateTime<Utc>) -> Result<ResolvedWindow> {
  let mode: WindowMode = config
    .mode
    .as_deref()
    .ok_or_else(|| ReportError::config("window mode is required"))?
    .parse()?;

  match mode {
    WindowMode::CustomRange => {
      reject_extra(mode, &[("rolling_days", config.rolling_days.is_some())])?;
      let (Some(raw_start), Some(raw_end)) = (config.start.as_deref(), config.end.as_deref()) else {
        return Err(ReportError::config("custom_range requires both 'start' and 'end'"));
      };
      let start = parse_day(raw_start, "start")?;
      let end = parse_day(raw_end, "end")?;
      if start > end {
        return Err(ReportError::validation(format!("window start {start} is after end {end}")));
      }

      Ok(ResolvedWindow {
        mode,
        start,
        end,
        interval_days: None,
        label: format!("{start} to {end}"),
      })
    }
    WindowMode::LastWeek => {
      reject_extra(
        mode,
        &[
          ("start", config.start.is_some()),
          ("end", config.end.is_some()),
          ("rolling_days", config.rolling_days.is_some()),
        ],
      )?;
      let today = today_in(config.timezone.as_deref(), now);
      let (start, end) = last_week_range(today);
      let iso = start.iso_week();

      Ok(ResolvedWindow {
        mode,
        start,
        end,
        interval_days: None,
        label: format!("Last week {}-W{:02} ({start} to {end})", iso.year(), iso.week()),
      })
    }
    WindowMode::RollingDays => {
      reject_extra(mode, &[("start", config.start.is_some()), ("end", config.end.is_some())])?;
      let raw = config
        .rolling_days
        .ok_or_else(|| ReportError::config("rolling_days mode requires 'rolling_days'"))?;
      let n = u32::try_from(raw.max(1))
        .map_err(|_| ReportError::validation(format!("rolling_days {raw} is out of range")))?;
      let today = today_in(config.timezone.as_deref(), now);
      let (start, end) = rolling_range(today, n)
        .ok_or_else(|| ReportError::validation(format!("rolling_days {raw} is out of range")))?;

      Ok(ResolvedWindow {
        mode,
        start,
        end,
        interval_days: Some(n),
        label: format!("Last {n} days ({start} to {end})"),
      })
    }
  }
}
