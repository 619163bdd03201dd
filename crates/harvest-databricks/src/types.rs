use serde::{Deserialize, Serialize};

/// Identifier of a job provisioned on the workspace.
pub type JobId = u64;

/// Identifier of one run of a job.
pub type RunId = u64;

/// Life-cycle state reported for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifeCycleState {
  Queued,
  Pending,
  Running,
  Terminating,
  Terminated,
  Skipped,
  InternalError,
  Blocked,
  WaitingForRetry,
  #[serde(other)]
  Unknown,
}

impl LifeCycleState {
  /// The run will not change state again.
  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      LifeCycleState::Terminated | LifeCycleState::Skipped | LifeCycleState::InternalError
    )
  }
}

/// Outcome of a run that reached a terminal life-cycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultState {
  Success,
  SuccessWithFailures,
  Failed,
  Timedout,
  Canceled,
  MaximumConcurrentRunsReached,
  Excluded,
  UpstreamFailed,
  UpstreamCanceled,
  #[serde(other)]
  Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
  pub life_cycle_state: LifeCycleState,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub result_state: Option<ResultState>,
  #[serde(default)]
  pub state_message: String,
}

impl RunState {
  pub fn is_terminal(&self) -> bool {
    self.life_cycle_state.is_terminal()
  }

  /// Terminal and successful.
  pub fn is_success(&self) -> bool {
    self.is_terminal() && self.result_state == Some(ResultState::Success)
  }
}

/// The subset of `runs/get` the trigger reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
  pub run_id: RunId,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub run_page_url: Option<String>,
  pub state: RunState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunNowResponse {
  pub run_id: RunId,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub number_in_job: Option<u64>,
}
