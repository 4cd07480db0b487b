use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
  /// Unknown window mode, missing mode parameters, unreadable run document.
  #[error("configuration error: {0}")]
  Config(String),

  /// Malformed dates, inverted windows, ambiguous query bounds, duplicate keys.
  #[error("validation error: {0}")]
  Validation(String),

  /// Transport, auth and rate-limit failures from the tracker.
  #[error("upstream error: {0}")]
  Upstream(String),

  #[error("delivery error: {0}")]
  Delivery(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Json(#[from] serde_json::Error),

  #[error(transparent)]
  Csv(#[from] csv::Error),
}

impl ReportError {
  pub fn config(msg: impl Into<String>) -> Self {
    ReportError::Config(msg.into())
  }

  pub fn validation(msg: impl Into<String>) -> Self {
    ReportError::Validation(msg.into())
  }

  pub fn upstream(msg: impl Into<String>) -> Self {
    ReportError::Upstream(msg.into())
  }
}

pub type Result<T> = std::result::Result<T, ReportError>;
