use harvest_databricks::{DatabricksError, ResultState, RunId};

/// Error type for a run-now task attempt.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
  #[error("failed to start job {job_id}")]
  Submit {
    job_id: u64,
    #[source]
    source: DatabricksError,
  },

  #[error("failed to read state of run {run_id}")]
  Poll {
    run_id: RunId,
    #[source]
    source: DatabricksError,
  },

  /// The remote run finished without succeeding.
  #[error("run {run_id} finished with {}: {message}", describe(.result_state))]
  RunFailed {
    run_id: RunId,
    result_state: Option<ResultState>,
    message: String,
  },

  #[error("run cancelled")]
  Cancelled,
}

fn describe(state: &Option<ResultState>) -> String {
  match state {
    Some(state) => format!("{state:?}"),
    None => "no result state".to_string(),
  }
}
