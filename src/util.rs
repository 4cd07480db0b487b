// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Small helpers shared by the binary: absolute paths, the pinned "now", outbox directory, man page
// role: utilities/helpers
// inputs: CLI paths and the `--out` value; optional "now" override; clap CommandFactory
// outputs: Absolute path strings, ensured outbox directory, troff text
// side_effects: prepare_out_dir creates directories
// invariants:
// - prepare_out_dir returns a directory that exists
// - "-" always maps to a fresh timestamped directory under the system temp dir
// errors: directory creation and man page rendering failures carry the offending path or command name
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::CommandFactory;

/// Absolute form of `p`; falls back to joining onto the cwd when the path does not exist yet.
pub fn canonicalize_lossy<P: AsRef<Path>>(p: P) -> String {
  let raw = p.as_ref();
  let abs = std::fs::canonicalize(raw)
    .or_else(|_| std::env::current_dir().map(|cwd| cwd.join(raw)))
    .unwrap_or_else(|_| raw.to_path_buf());
  abs.to_string_lossy().into_owned()
}

/// The instant a run treats as "now".
pub fn effective_now(override_now: Option<DateTime<Utc>>) -> DateTime<Utc> {
  override_now.unwrap_or_else(Utc::now)
}

/// Outbox for one run: the `--out` directory, or `jira-report-<stamp>` under the temp dir for "-".
pub fn prepare_out_dir(out: &str, now: DateTime<Utc>) -> Result<PathBuf> {
  let dir = match out {
    "-" => std::env::temp_dir().join(format!("jira-report-{}", now.format("%Y%m%d-%H%M%S"))),
    given => PathBuf::from(given),
  };
  std::fs::create_dir_all(&dir).with_context(|| format!("creating outbox {}", dir.display()))?;
  Ok(dir)
}

/// Section-1 man page for the CLI, as troff text.
pub fn render_man_page<T: CommandFactory>() -> Result<String> {
  let cmd = T::command();
  let name = cmd.get_name().to_string();
  let mut troff: Vec<u8> = Vec::new();
  clap_mangen::Man::new(cmd)
    .render(&mut troff)
    .with_context(|| format!("rendering man page for {name}"))?;
  Ok(String::from_utf8_lossy(&troff).into_owned())
}
