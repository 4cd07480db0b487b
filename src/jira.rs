// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Issue retrieval seam plus the Jira REST implementation (paginated enhanced search with retry) and an offline file source
// role: collaborator/fetch
// inputs: JiraConnection (explicit, never read from env here), FetchSettings, project key, JQL
// outputs: Vec<IssueRecord>, deduplicated by key, first occurrence wins
// side_effects: HTTP calls to {base}/rest/api/3/search/jql; sleeps between retries; reads fixture files
// invariants:
// - at most `page_cap` pages are requested per query
// - 429/500/502/503/504 and transport failures are retried up to `max_retries` times with exponential backoff
// - any other non-success status fails immediately
// errors: UpstreamError (opaque to the core); ConfigError for invalid connection settings
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::ext::serde_json::JsonFetch;
use crate::issue::{normalize_all, IssueRecord};

const SEARCH_FIELDS: &str = "summary,issuetype,status,assignee,created,resolutiondate,resolution,updated,priority";
const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Where the tracker lives and how to authenticate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JiraConnection {
  pub base_url: String,
  pub email: String,
  pub api_token: String,
}

impl JiraConnection {
  pub fn new(base_url: &str, email: &str, api_token: &str) -> Result<Self> {
    let base = base_url.trim().trim_end_matches('/');
    if !base.starts_with("http://") && !base.starts_with("https://") {
      return Err(ReportError::config(format!("Jira base URL must start with http(s)://, got '{base_url}'")));
    }
    if email.trim().is_empty() || api_token.trim().is_empty() {
      return Err(ReportError::config("Jira email and API token are required"));
    }
    Ok(Self {
      base_url: base.to_string(),
      email: email.trim().to_string(),
      api_token: api_token.trim().to_string(),
    })
  }

  fn authorization(&self) -> String {
    let raw = format!("{}:{}", self.email, self.api_token);
    format!("Basic {}", BASE64_STANDARD.encode(raw))
  }

  pub fn search_url(&self) -> String {
    format!("{}/rest/api/3/search/jql", self.base_url)
  }

  pub fn browse_url(&self, key: &str) -> String {
    format!("{}/browse/{}", self.base_url, key)
  }
}

/// Pagination and retry knobs (the `fetch` section of the run document).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
  pub page_size: u32,
  pub page_cap: u32,
  pub max_retries: u32,
  pub backoff_ms: u64,
  pub timeout_secs: u64,
}

impl Default for FetchSettings {
  fn default() -> Self {
    Self {
      page_size: 100,
      page_cap: 500,
      max_retries: 5,
      backoff_ms: 600,
      timeout_secs: 30,
    }
  }
}

impl FetchSettings {
  /// Delay before retry number `attempt` (0-based): `backoff * 2^attempt`.
  pub fn backoff_delay(&self, attempt: u32) -> Duration {
    Duration::from_millis(self.backoff_ms.saturating_mul(1u64 << attempt.min(16)))
  }
}

/// Retrieval seam between the report run and the tracker.
pub trait IssueSource {
  fn fetch_issues(&self, project_key: &str, query: &str) -> Result<Vec<IssueRecord>>;
}

pub fn dedupe_by_key(issues: Vec<IssueRecord>) -> Vec<IssueRecord> {
  let mut seen: HashSet<String> = HashSet::with_capacity(issues.len());
  let before = issues.len();
  let out: Vec<IssueRecord> = issues.into_iter().filter(|i| seen.insert(i.key.clone())).collect();
  if out.len() != before {
    tracing::debug!(dropped = before - out.len(), "dropped duplicate issues across pages");
  }
  out
}

pub struct JiraClient {
  conn: JiraConnection,
  settings: FetchSettings,
  agent: ureq::Agent,
}

enum Attempt {
  Done(serde_json::Value),
  Retry(String),
  Fail(String),
}

impl JiraClient {
  pub fn new(conn: JiraConnection, settings: FetchSettings) -> Self {
    let agent: ureq::Agent = ureq::Agent::config_builder()
      .timeout_global(Some(Duration::from_secs(settings.timeout_secs.max(1))))
      .http_status_as_error(false)
      .build()
      .into();

    Self { conn, settings, agent }
  }

  pub fn connection(&self) -> &JiraConnection {
    &self.conn
  }

  fn attempt(&self, jql: &str, token: Option<&str>) -> Attempt {
    let page_size = self.settings.page_size.clamp(1, 5000).to_string();
    let url = self.conn.search_url();
    let mut req = self
      .agent
      .get(url.as_str())
      .header("Accept", "application/json")
      .header("User-Agent", "jira-window-report")
      .header("Authorization", &self.conn.authorization())
      .query("jql", jql)
      .query("maxResults", &page_size)
      .query("fields", SEARCH_FIELDS);
    if let Some(t) = token {
      req = req.query("nextPageToken", t);
    }

    match req.call() {
      Ok(mut resp) => {
        let status = resp.status().as_u16();
        if resp.status().is_success() {
          return match resp.body_mut().read_json::<serde_json::Value>() {
            Ok(v) => Attempt::Done(v),
            Err(e) => Attempt::Fail(format!("invalid JSON from Jira search: {e}")),
          };
        }
        let body = resp.body_mut().read_to_string().unwrap_or_default();
        let excerpt: String = body.chars().take(300).collect();
        let msg = format!("Jira search returned HTTP {status}: {excerpt}");
        if RETRY_STATUSES.contains(&status) {
          Attempt::Retry(msg)
        } else {
          Attempt::Fail(msg)
        }
      }
      Err(e) => Attempt::Retry(format!("Jira search request failed: {e}")),
    }
  }

  fn search_page(&self, jql: &str, token: Option<&str>) -> Result<serde_json::Value> {
    let mut attempt = 0u32;
    loop {
      match self.attempt(jql, token) {
        Attempt::Done(v) => return Ok(v),
        Attempt::Fail(msg) => return Err(ReportError::upstream(msg)),
        Attempt::Retry(msg) => {
          if attempt >= self.settings.max_retries {
            return Err(ReportError::upstream(format!("{msg} (gave up after {attempt} retries)")));
          }
          let delay = self.settings.backoff_delay(attempt);
          tracing::warn!(attempt = attempt + 1, delay_ms = delay.as_millis() as u64, "{msg}; retrying");
          std::thread::sleep(delay);
          attempt += 1;
        }
      }
    }
  }
}

impl IssueSource for JiraClient {
  fn fetch_issues(&self, project_key: &str, query: &str) -> Result<Vec<IssueRecord>> {
    let mut issues: Vec<IssueRecord> = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0u32;

    loop {
      let page = self.search_page(query, token.as_deref())?;
      pages += 1;

      let raw: Vec<serde_json::Value> = page.fetch("issues").to_or_default();
      tracing::debug!(project = project_key, page = pages, received = raw.len(), "fetched search page");
      issues.extend(normalize_all(&raw));

      token = page.fetch("nextPageToken").text();
      if token.is_none() {
        break;
      }
      if pages >= self.settings.page_cap {
        tracing::warn!(
          project = project_key,
          page_cap = self.settings.page_cap,
          "page cap reached; result set truncated"
        );
        break;
      }
    }

    Ok(dedupe_by_key(issues))
  }
}

/// Offline source: a JSON object mapping project keys to raw issue arrays.
pub struct FileIssueSource {
  by_project: HashMap<String, Vec<serde_json::Value>>,
}

impl FileIssueSource {
  pub fn from_value(v: serde_json::Value) -> Result<Self> {
    let by_project: HashMap<String, Vec<serde_json::Value>> = serde_json::from_value(v)
      .map_err(|e| ReportError::config(format!("issues file must map project keys to issue arrays: {e}")))?;
    Ok(Self { by_project })
  }

  pub fn load(path: &Path) -> Result<Self> {
    let data = std::fs::read(path)
      .map_err(|e| ReportError::config(format!("reading issues file {}: {e}", path.display())))?;
    let v: serde_json::Value = serde_json::from_slice(&data)
      .map_err(|e| ReportError::config(format!("parsing issues file {}: {e}", path.display())))?;
    Self::from_value(v)
  }
}

impl IssueSource for FileIssueSource {
  fn fetch_issues(&self, project_key: &str, _query: &str) -> Result<Vec<IssueRecord>> {
    let raw = self.by_project.get(project_key).map(Vec::as_slice).unwrap_or(&[]);
    Ok(dedupe_by_key(normalize_all(raw)))
  }
}
