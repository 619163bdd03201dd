//! Run-now task execution.

use std::sync::Arc;
use std::time::Duration;

use harvest_config::RunNowTaskDef;
use harvest_databricks::{JobsApi, Run, RunId, RunState};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::error::TriggerError;

/// Transient status-poll failures tolerated in a row before giving up.
const DEFAULT_API_RETRY_LIMIT: u32 = 3;
const DEFAULT_API_RETRY_DELAY: Duration = Duration::from_secs(1);

/// A remote run that reached a successful terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRun {
  pub run_id: RunId,
  pub run_page_url: Option<String>,
  pub state: RunState,
}

/// Starts a remote job and waits for its run to finish.
pub struct RunNowOperator {
  task: RunNowTaskDef,
  api: Arc<dyn JobsApi>,
  polling_period: Duration,
  api_retry_limit: u32,
  api_retry_delay: Duration,
}

impl RunNowOperator {
  pub fn new(task: RunNowTaskDef, api: Arc<dyn JobsApi>) -> Self {
    let polling_period = Duration::from_secs(task.polling_period_secs.max(1));
    Self {
      task,
      api,
      polling_period,
      api_retry_limit: DEFAULT_API_RETRY_LIMIT,
      api_retry_delay: DEFAULT_API_RETRY_DELAY,
    }
  }

  pub fn with_polling_period(mut self, period: Duration) -> Self {
    self.polling_period = period;
    self
  }

  pub fn with_api_retries(mut self, limit: u32, delay: Duration) -> Self {
    self.api_retry_limit = limit;
    self.api_retry_delay = delay;
    self
  }

  pub fn task(&self) -> &RunNowTaskDef {
    &self.task
  }

  /// Start the job and block until its run is terminal.
  ///
  /// `on_started` is called with the remote run id as soon as it is known.
  /// If `cancel` fires while waiting, cancellation is requested for the
  /// remote run (best effort) and [`TriggerError::Cancelled`] is returned.
  #[instrument(
    name = "run_now",
    skip(self, cancel, on_started),
    fields(task_id = %self.task.task_id, job_id = self.task.job_id)
  )]
  pub async fn execute(
    &self,
    cancel: CancellationToken,
    mut on_started: impl FnMut(RunId, Option<&str>) + Send,
  ) -> Result<RemoteRun, TriggerError> {
    if cancel.is_cancelled() {
      return Err(TriggerError::Cancelled);
    }

    let job_id = self.task.job_id;
    let submitted = tokio::select! {
      result = self.api.run_now(job_id) => {
        result.map_err(|source| TriggerError::Submit { job_id, source })?
      }
      _ = cancel.cancelled() => return Err(TriggerError::Cancelled),
    };
    let run_id = submitted.run_id;
    info!(run_id, "run submitted");

    let mut announced = false;
    loop {
      let run = tokio::select! {
        result = self.poll(run_id) => result?,
        _ = cancel.cancelled() => return Err(self.cancel_remote(run_id).await),
      };

      if !announced {
        if let Some(url) = &run.run_page_url {
          info!(run_id, run_page_url = %url, "view run status, Spark UI, and logs at the run page");
        }
        on_started(run_id, run.run_page_url.as_deref());
        announced = true;
      }

      if run.state.is_terminal() {
        return self.finish(run);
      }

      info!(
        run_id,
        life_cycle_state = ?run.state.life_cycle_state,
        "run in progress, waiting {}s",
        self.polling_period.as_secs()
      );

      tokio::select! {
        _ = tokio::time::sleep(self.polling_period) => {}
        _ = cancel.cancelled() => return Err(self.cancel_remote(run_id).await),
      }
    }
  }

  fn finish(&self, run: Run) -> Result<RemoteRun, TriggerError> {
    if run.state.is_success() {
      info!(run_id = run.run_id, "run completed successfully");
      return Ok(RemoteRun {
        run_id: run.run_id,
        run_page_url: run.run_page_url,
        state: run.state,
      });
    }

    warn!(
      run_id = run.run_id,
      life_cycle_state = ?run.state.life_cycle_state,
      result_state = ?run.state.result_state,
      state_message = %run.state.state_message,
      "run failed"
    );
    Err(TriggerError::RunFailed {
      run_id: run.run_id,
      result_state: run.state.result_state,
      message: run.state.state_message,
    })
  }

  /// `runs/get`, retrying transient API errors.
  async fn poll(&self, run_id: RunId) -> Result<Run, TriggerError> {
    let mut attempt = 0;
    loop {
      match self.api.get_run(run_id).await {
        Ok(run) => return Ok(run),
        Err(e) if e.is_transient() && attempt < self.api_retry_limit => {
          attempt += 1;
          warn!(run_id, attempt, error = %e, "transient error reading run state, retrying");
          tokio::time::sleep(self.api_retry_delay).await;
        }
        Err(source) => return Err(TriggerError::Poll { run_id, source }),
      }
    }
  }

  async fn cancel_remote(&self, run_id: RunId) -> TriggerError {
    info!(run_id, "cancelling remote run");
    if let Err(e) = self.api.cancel_run(run_id).await {
      warn!(run_id, error = %e, "failed to cancel remote run");
    }
    TriggerError::Cancelled
  }
}

#[cfg(test)]
mod tests {
  use std::collections::VecDeque;
  use std::sync::Mutex;
  use std::sync::atomic::{AtomicU32, Ordering};

  use async_trait::async_trait;
  use harvest_databricks::{DatabricksError, LifeCycleState, ResultState, RunNowResponse};

  use super::*;

  /// Replays scripted `runs/get` answers; the last one repeats.
  struct ScriptedApi {
    states: Mutex<VecDeque<Result<RunState, DatabricksError>>>,
    submitted: AtomicU32,
    polls: AtomicU32,
    cancels: AtomicU32,
  }

  impl ScriptedApi {
    fn new(states: Vec<Result<RunState, DatabricksError>>) -> Arc<Self> {
      Arc::new(Self {
        states: Mutex::new(states.into()),
        submitted: AtomicU32::new(0),
        polls: AtomicU32::new(0),
        cancels: AtomicU32::new(0),
      })
    }
  }

  #[async_trait]
  impl JobsApi for ScriptedApi {
    async fn run_now(&self, _job_id: u64) -> Result<RunNowResponse, DatabricksError> {
      self.submitted.fetch_add(1, Ordering::SeqCst);
      Ok(RunNowResponse {
        run_id: 77,
        number_in_job: None,
      })
    }

    async fn get_run(&self, run_id: RunId) -> Result<Run, DatabricksError> {
      self.polls.fetch_add(1, Ordering::SeqCst);
      let mut states = self.states.lock().unwrap();
      let next = match states.front() {
        Some(Ok(state)) if states.len() == 1 => Ok(state.clone()),
        _ => states.pop_front().unwrap(),
      };
      next.map(|state| Run {
        run_id,
        run_page_url: Some(format!("https://example.com/run/{run_id}")),
        state,
      })
    }

    async fn cancel_run(&self, _run_id: RunId) -> Result<(), DatabricksError> {
      self.cancels.fetch_add(1, Ordering::SeqCst);
      Ok(())
    }
  }

  fn state(life: LifeCycleState, result: Option<ResultState>) -> RunState {
    RunState {
      life_cycle_state: life,
      result_state: result,
      state_message: String::new(),
    }
  }

  fn task() -> RunNowTaskDef {
    RunNowTaskDef {
      task_id: "run_job".to_string(),
      connection_id: "databricks_default".to_string(),
      job_id: 42,
      polling_period_secs: 30,
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_waits_until_terminal_success() {
    let api = ScriptedApi::new(vec![
      Ok(state(LifeCycleState::Pending, None)),
      Ok(state(LifeCycleState::Running, None)),
      Ok(state(LifeCycleState::Terminated, Some(ResultState::Success))),
    ]);
    let operator = RunNowOperator::new(task(), api.clone());

    let mut started = Vec::new();
    let run = operator
      .execute(CancellationToken::new(), |id, _| started.push(id))
      .await
      .unwrap();

    assert_eq!(run.run_id, 77);
    assert_eq!(started, vec![77]);
    assert_eq!(api.submitted.load(Ordering::SeqCst), 1);
    assert_eq!(api.polls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_failed_result_is_error() {
    let mut failed = state(LifeCycleState::Terminated, Some(ResultState::Failed));
    failed.state_message = "Task raised".to_string();
    let api = ScriptedApi::new(vec![Ok(failed)]);
    let operator = RunNowOperator::new(task(), api);

    let err = operator
      .execute(CancellationToken::new(), |_, _| {})
      .await
      .unwrap_err();

    assert!(matches!(
      err,
      TriggerError::RunFailed { run_id: 77, result_state: Some(ResultState::Failed), ref message }
        if message == "Task raised"
    ));
  }

  #[tokio::test(start_paused = true)]
  async fn test_transient_poll_errors_are_retried() {
    let api = ScriptedApi::new(vec![
      Err(DatabricksError::Api {
        status: 503,
        error_code: String::new(),
        message: "unavailable".to_string(),
      }),
      Ok(state(LifeCycleState::Terminated, Some(ResultState::Success))),
    ]);
    let operator = RunNowOperator::new(task(), api.clone());

    operator
      .execute(CancellationToken::new(), |_, _| {})
      .await
      .unwrap();
    assert_eq!(api.polls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_permanent_poll_error_fails() {
    let api = ScriptedApi::new(vec![Err(DatabricksError::Api {
      status: 403,
      error_code: "PERMISSION_DENIED".to_string(),
      message: "no access".to_string(),
    })]);
    let operator = RunNowOperator::new(task(), api);

    let err = operator
      .execute(CancellationToken::new(), |_, _| {})
      .await
      .unwrap_err();
    assert!(matches!(err, TriggerError::Poll { run_id: 77, .. }));
  }

  #[tokio::test(start_paused = true)]
  async fn test_cancel_while_waiting_cancels_remote_run() {
    let api = ScriptedApi::new(vec![Ok(state(LifeCycleState::Running, None))]);
    let operator = RunNowOperator::new(task(), api.clone());
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
      tokio::time::sleep(Duration::from_secs(95)).await;
      trigger.cancel();
    });

    let err = operator.execute(cancel, |_, _| {}).await.unwrap_err();

    assert!(matches!(err, TriggerError::Cancelled));
    assert_eq!(api.cancels.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_already_cancelled_submits_nothing() {
    let api = ScriptedApi::new(vec![Ok(state(LifeCycleState::Running, None))]);
    let operator = RunNowOperator::new(task(), api.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = operator.execute(cancel, |_, _| {}).await.unwrap_err();

    assert!(matches!(err, TriggerError::Cancelled));
    assert_eq!(api.submitted.load(Ordering::SeqCst), 0);
  }
}
