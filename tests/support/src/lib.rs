//! test-support: fixtures, tracing and process helpers for the report crate's tests.
//!
//! ```rust,no_run
//! let cfg = test_support::fixture_path("config.json");
//! test_support::report_cmd().args(["--config", &cfg, "--dry-run"]).assert().success();
//! ```

use once_cell::sync::Lazy;
use tracing_subscriber::{fmt, EnvFilter};

use std::{env, path::{Path, PathBuf}};

static TRACING: Lazy<()> = Lazy::new(|| {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,jira_window_report=info"));
    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
});

/// Route library logs through the test writer; later calls are no-ops.
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// Return the path to the repository's `tests/fixtures` directory.
///
/// `CARGO_MANIFEST_DIR` here is the support crate, so step up to the package root.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("fixtures")
}

/// Absolute path of a fixture file, as a string for CLI arguments.
pub fn fixture_path<P: AsRef<Path>>(rel_path: P) -> String {
    fixtures_dir().join(rel_path).to_string_lossy().to_string()
}

/// Fixture file contents as text.
pub fn read_fixture_text(rel_path: impl AsRef<Path>) -> String {
    let path = fixtures_dir().join(rel_path);
    match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => panic!("cannot read fixture {}: {e}", path.display()),
    }
}

/// Deserialize a JSON fixture into `T` (enable `serde` feature).
#[cfg(feature = "serde")]
pub fn read_fixture_json<T: serde::de::DeserializeOwned>(rel_path: impl AsRef<Path>) -> T {
    let text = read_fixture_text(&rel_path);
    serde_json::from_str(&text).unwrap_or_else(|e| {
        panic!("fixture {} is not the expected JSON: {e}", rel_path.as_ref().display())
    })
}

/// Scratch outbox, removed when dropped.
pub fn tempdir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("jira-report-test-")
        .tempdir()
        .expect("create tempdir")
}

/// The report binary with tracing initialised and Jira credentials cleared.
pub fn report_cmd() -> assert_cmd::Command {
    init_tracing();
    let mut cmd = assert_cmd::Command::cargo_bin("jira-window-report").expect("binary target not found");
    cmd.env_remove("JIRA_BASE_URL")
        .env_remove("JIRA_EMAIL")
        .env_remove("JIRA_API_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// Set (`Some`) or clear (`None`) environment variables until the returned guard drops.
pub fn with_env(vars: &[(&str, Option<&str>)]) -> ScopedEnv {
    let mut scoped = ScopedEnv { saved: Vec::new() };
    for (name, value) in vars {
        scoped.saved.push((name.to_string(), env::var_os(name)));
        match value {
            Some(v) => env::set_var(name, v),
            None => env::remove_var(name),
        }
    }
    scoped
}

/// Restores every variable touched by [`with_env`] on drop.
pub struct ScopedEnv {
    saved: Vec<(String, Option<std::ffi::OsString>)>,
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        while let Some((name, before)) = self.saved.pop() {
            if let Some(v) = before {
                env::set_var(&name, v);
            } else {
                env::remove_var(&name);
            }
        }
    }
}
