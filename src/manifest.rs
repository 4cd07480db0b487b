// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Persist the run summary as manifest.json next to the delivered reports
// role: persistence/manifest
// inputs: outbox directory, RunSummary
// outputs: manifest.json file written under the outbox directory
// side_effects: Writes to filesystem
// invariants:
// - projects[] keeps configuration order
// - file paths in outcomes are relative to the outbox directory
// errors: IO errors surfaced with full path context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::runner::RunSummary;

pub const MANIFEST_FILE: &str = "manifest.json";

pub fn write_run_manifest(base_dir: &Path, summary: &RunSummary) -> Result<PathBuf> {
  let path = base_dir.join(MANIFEST_FILE);
  let bytes = serde_json::to_vec_pretty(summary)?;
  std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
  Ok(path)
}
