//! Run instance state machine.
//!
//! ```text
//! queued ──► running ──► succeeded
//!   ▲           │ ├────► failed
//!   │           ▼ └────► cancelled
//!   └──── up_for_retry ─► cancelled
//! ```

use chrono::{DateTime, Utc};
use harvest_config::DagDef;
use harvest_trigger::{Activation, RunContext, RunRequest};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
  Queued,
  Running,
  /// An attempt failed and another one is pending after the retry delay.
  UpForRetry,
  Succeeded,
  Failed,
  Cancelled,
}

impl RunStatus {
  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      RunStatus::Succeeded | RunStatus::Failed | RunStatus::Cancelled
    )
  }

  pub fn can_transition_to(self, next: RunStatus) -> bool {
    use RunStatus::*;
    matches!(
      (self, next),
      (Queued, Running)
        | (Queued, Cancelled)
        | (Running, Succeeded)
        | (Running, Failed)
        | (Running, UpForRetry)
        | (Running, Cancelled)
        | (UpForRetry, Queued)
        | (UpForRetry, Cancelled)
    )
  }
}

/// One activation of a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInstance {
  pub run_id: String,
  pub dag_id: String,
  pub task_id: String,
  pub job_id: u64,
  pub activation: Activation,
  pub status: RunStatus,
  /// Attempts started so far.
  pub try_number: u32,
  pub max_tries: u32,
  pub queued_at: DateTime<Utc>,
  pub started_at: Option<DateTime<Utc>>,
  pub ended_at: Option<DateTime<Utc>>,
  pub remote_run_id: Option<u64>,
  pub run_page_url: Option<String>,
  pub last_error: Option<String>,
}

impl RunInstance {
  pub fn new(dag: &DagDef, request: RunRequest, max_tries: u32) -> Self {
    Self {
      run_id: request.request_id,
      dag_id: dag.dag_id.clone(),
      task_id: dag.task.task_id.clone(),
      job_id: dag.task.job_id,
      activation: request.activation,
      status: RunStatus::Queued,
      try_number: 0,
      max_tries,
      queued_at: request.requested_at,
      started_at: None,
      ended_at: None,
      remote_run_id: None,
      run_page_url: None,
      last_error: None,
    }
  }

  /// Move to `next`, stamping start and end times.
  pub fn transition(&mut self, next: RunStatus) -> Result<(), EngineError> {
    if !self.status.can_transition_to(next) {
      return Err(EngineError::InvalidTransition {
        from: self.status,
        to: next,
      });
    }

    let now = Utc::now();
    match next {
      RunStatus::Running => {
        self.try_number += 1;
        self.started_at.get_or_insert(now);
      }
      status if status.is_terminal() => self.ended_at = Some(now),
      _ => {}
    }
    self.status = next;
    Ok(())
  }

  /// What observers are told about this run.
  pub fn context(&self) -> RunContext {
    RunContext {
      dag_id: self.dag_id.clone(),
      task_id: self.task_id.clone(),
      run_id: self.run_id.clone(),
      activation: self.activation,
      try_number: self.try_number,
      max_tries: self.max_tries,
      job_id: self.job_id,
      remote_run_id: self.remote_run_id,
      run_page_url: self.run_page_url.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use harvest_config::agricultural_crop_production;

  use super::*;

  fn instance() -> RunInstance {
    RunInstance::new(
      &agricultural_crop_production(),
      RunRequest::manual(),
      2,
    )
  }

  #[test]
  fn test_retry_path() {
    let mut run = instance();

    run.transition(RunStatus::Running).unwrap();
    run.transition(RunStatus::UpForRetry).unwrap();
    run.transition(RunStatus::Queued).unwrap();
    run.transition(RunStatus::Running).unwrap();
    run.transition(RunStatus::Succeeded).unwrap();

    assert_eq!(run.try_number, 2);
    assert!(run.started_at.is_some());
    assert!(run.ended_at.is_some());
  }

  #[test]
  fn test_terminal_states_are_final() {
    let mut run = instance();
    run.transition(RunStatus::Running).unwrap();
    run.transition(RunStatus::Failed).unwrap();

    let err = run.transition(RunStatus::Queued).unwrap_err();
    assert!(matches!(
      err,
      EngineError::InvalidTransition {
        from: RunStatus::Failed,
        to: RunStatus::Queued
      }
    ));
  }

  #[test]
  fn test_cannot_succeed_without_running() {
    let mut run = instance();
    assert!(run.transition(RunStatus::Succeeded).is_err());
    assert_eq!(run.status, RunStatus::Queued);
  }

  #[test]
  fn test_context_carries_ids() {
    let run = instance();
    let ctx = run.context();

    assert_eq!(ctx.dag_id, "Agricultural_Crop_Production_databricks_etl");
    assert_eq!(ctx.task_id, "run_agricultural_crop_production_serverless_job");
    assert_eq!(ctx.run_id, run.run_id);
  }
}
