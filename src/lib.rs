//! Per-project Jira window reports.
//!
//! A run resolves one reporting window, builds a single union query per
//! project, classifies the returned issues into the four backlog buckets
//! and hands a rendered report to a delivery sink.

pub mod classify;
pub mod config;
pub mod deliver;
pub mod error;
pub mod ext;
pub mod issue;
pub mod jira;
pub mod manifest;
pub mod query;
pub mod render;
pub mod runner;
pub mod util;
pub mod window;

pub use error::{ReportError, Result};
