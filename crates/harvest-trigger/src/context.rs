//! What observers are told about a finished run.

use std::error::Error;

use serde::{Deserialize, Serialize};

use crate::types::Activation;

/// Identifies a run and the definition it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
  pub dag_id: String,
  pub task_id: String,
  pub run_id: String,
  pub activation: Activation,
  /// 1-based attempt number of the attempt that ended the run.
  pub try_number: u32,
  pub max_tries: u32,
  pub job_id: u64,
  /// Remote run started by the last attempt, if any.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub remote_run_id: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub run_page_url: Option<String>,
}

/// Captured failure information: the error and its cause chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
  pub message: String,
  pub causes: Vec<String>,
}

impl RunFailure {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      causes: Vec::new(),
    }
  }

  /// Capture an error and walk its `source()` chain.
  pub fn from_error(error: &(dyn Error + 'static)) -> Self {
    let mut causes = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
      causes.push(cause.to_string());
      source = cause.source();
    }

    Self {
      message: error.to_string(),
      causes,
    }
  }

  /// Render as a trace block: the error line followed by `Caused by:` lines.
  pub fn trace(&self) -> String {
    let mut out = format!("Error: {}", self.message);
    for (i, cause) in self.causes.iter().enumerate() {
      out.push_str(&format!("\nCaused by ({i}): {cause}"));
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, thiserror::Error)]
  #[error("outer")]
  struct Outer(#[source] Inner);

  #[derive(Debug, thiserror::Error)]
  #[error("inner")]
  struct Inner;

  #[test]
  fn test_captures_cause_chain() {
    let failure = RunFailure::from_error(&Outer(Inner));

    assert_eq!(failure.message, "outer");
    assert_eq!(failure.causes, vec!["inner".to_string()]);
    assert_eq!(failure.trace(), "Error: outer\nCaused by (0): inner");
  }

  #[test]
  fn test_plain_failure_trace() {
    assert_eq!(RunFailure::new("boom").trace(), "Error: boom");
  }
}
