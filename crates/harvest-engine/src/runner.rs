//! Definition runner with channel-based activation.
//!
//! The `DagRunner` owns an mpsc channel of [`RunRequest`]s. Each request
//! becomes one [`RunInstance`] that is driven through the run state machine:
//! the run-now operator is executed, failed attempts are retried per the
//! definition's [`RetryPolicy`], and the observer is told the terminal
//! outcome exactly once.

use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::Arc;

use harvest_config::DagDef;
use harvest_trigger::{RunFailure, RunNowOperator, RunObserver, RunRequest, TriggerError};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::EngineError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::retry::RetryPolicy;
use crate::state::{RunInstance, RunStatus};

const DEFAULT_BUFFER_SIZE: usize = 100;

/// Everything a run needs, shared by concurrently executing runs.
struct RunHost<N> {
  dag: DagDef,
  operator: RunNowOperator,
  observer: Arc<dyn RunObserver>,
  retry: RetryPolicy,
  notifier: N,
}

/// Hosts one definition: accepts activations and executes runs.
///
/// # Usage
///
/// ```ignore
/// let runner = DagRunner::new(dag, operator, Arc::new(observer))?;
///
/// // Get sender for manual activations (CLI, API handlers, etc.)
/// let sender = runner.sender();
///
/// // Start the activation loop
/// let cancel = CancellationToken::new();
/// runner.start(cancel).await?;
/// ```
pub struct DagRunner<N: ExecutionNotifier = NoopNotifier> {
  host: Arc<RunHost<N>>,
  sender: mpsc::Sender<RunRequest>,
  receiver: mpsc::Receiver<RunRequest>,
}

impl DagRunner<NoopNotifier> {
  /// Create a runner that discards execution events.
  pub fn new(
    dag: DagDef,
    operator: RunNowOperator,
    observer: Arc<dyn RunObserver>,
  ) -> Result<Self, EngineError> {
    Self::with_notifier(dag, operator, observer, NoopNotifier)
  }
}

impl<N: ExecutionNotifier + 'static> DagRunner<N> {
  /// Create a runner with a custom notifier.
  ///
  /// The definition is validated here; a runner never holds an invalid one.
  pub fn with_notifier(
    dag: DagDef,
    operator: RunNowOperator,
    observer: Arc<dyn RunObserver>,
    notifier: N,
  ) -> Result<Self, EngineError> {
    dag.validate()?;

    info!(dag_id = %dag.dag_id, owner = %dag.default_args.owner, "Initializing {}", dag.dag_id);
    info!(
      dag_id = %dag.dag_id,
      task_id = %operator.task().task_id,
      "RunNowOperator configured with job_id={}",
      operator.task().job_id
    );

    let retry = RetryPolicy::from_args(&dag.default_args);
    let (sender, receiver) = mpsc::channel(DEFAULT_BUFFER_SIZE);

    Ok(Self {
      host: Arc::new(RunHost {
        dag,
        operator,
        observer,
        retry,
        notifier,
      }),
      sender,
      receiver,
    })
  }

  pub fn dag(&self) -> &DagDef {
    &self.host.dag
  }

  pub fn retry_policy(&self) -> RetryPolicy {
    self.host.retry
  }

  /// Get a sender handle for manual activations.
  pub fn sender(&self) -> mpsc::Sender<RunRequest> {
    self.sender.clone()
  }

  /// Request a manual run. Returns the id the run will have.
  pub async fn trigger(&self) -> Result<String, EngineError> {
    let request = RunRequest::manual();
    let run_id = request.request_id.clone();
    self
      .sender
      .send(request)
      .await
      .map_err(|_| EngineError::ChannelClosed)?;
    Ok(run_id)
  }

  /// Execute a single run to its terminal state (without the loop).
  pub async fn execute_once(&self, request: RunRequest, cancel: CancellationToken) -> RunInstance {
    self.host.execute(request, cancel).await
  }

  /// Start the activation loop.
  ///
  /// Blocks until the cancellation token fires. Runs are executed
  /// concurrently unless the definition sets `depends_on_past`, in which case
  /// each run finishes before the next one starts. On exit, in-flight runs
  /// are cancelled and awaited so each still reports its terminal outcome.
  pub async fn start(self, cancel: CancellationToken) -> Result<(), EngineError> {
    // The runner's own sender stays alive, so a scheduled definition keeps
    // ticking with no external senders.
    let DagRunner {
      host,
      sender: _sender,
      mut receiver,
    } = self;

    let dag_id = host.dag.dag_id.clone();
    let serial = host.dag.default_args.depends_on_past;
    let mut ticker = host.dag.schedule.map(|schedule| {
      let period = schedule.interval();
      let mut interval = tokio::time::interval_at(Instant::now() + period, period);
      interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
      interval
    });

    info!(
      dag_id = %dag_id,
      manual_only = ticker.is_none(),
      "starting dag runner"
    );

    let runs_cancel = cancel.child_token();
    let mut in_flight: JoinSet<RunInstance> = JoinSet::new();

    loop {
      // Cancellation wins over queued requests and ticks.
      let request = tokio::select! {
        biased;

        _ = cancel.cancelled() => {
          info!(dag_id = %dag_id, "dag runner cancelled");
          break;
        }
        Some(request) = receiver.recv() => request,
        _ = next_tick(ticker.as_mut()) => RunRequest::scheduled(),
        Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
          log_joined(&dag_id, joined);
          continue;
        }
      };

      info!(
        dag_id = %dag_id,
        run_id = %request.request_id,
        activation = ?request.activation,
        "activating dag run"
      );

      let host = host.clone();
      let run_cancel = runs_cancel.child_token();
      if serial {
        host.execute(request, run_cancel).await;
      } else {
        in_flight.spawn(async move { host.execute(request, run_cancel).await });
      }
    }

    runs_cancel.cancel();
    while let Some(joined) = in_flight.join_next().await {
      log_joined(&dag_id, joined);
    }

    Ok(())
  }
}

impl<N: ExecutionNotifier> RunHost<N> {
  async fn execute(&self, request: RunRequest, cancel: CancellationToken) -> RunInstance {
    let mut run = RunInstance::new(&self.dag, request, self.retry.max_tries());
    self.notifier.notify(ExecutionEvent::RunQueued {
      run_id: run.run_id.clone(),
      dag_id: run.dag_id.clone(),
    });

    loop {
      if cancel.is_cancelled() {
        return self.settle_cancelled(run);
      }

      self.advance(&mut run, RunStatus::Running);
      self.notifier.notify(ExecutionEvent::RunStarted {
        run_id: run.run_id.clone(),
        try_number: run.try_number,
      });
      info!(
        dag_id = %run.dag_id,
        run_id = %run.run_id,
        try_number = run.try_number,
        max_tries = run.max_tries,
        "run attempt started"
      );

      let mut started = None;
      let result = self
        .operator
        .execute(cancel.clone(), |remote_run_id, url| {
          started = Some((remote_run_id, url.map(str::to_string)));
        })
        .await;
      if let Some((remote_run_id, url)) = started {
        run.remote_run_id = Some(remote_run_id);
        run.run_page_url = url;
      }

      let err = match result {
        Ok(remote) => {
          run.remote_run_id = Some(remote.run_id);
          self.advance(&mut run, RunStatus::Succeeded);
          self.notifier.notify(ExecutionEvent::RunSucceeded {
            run_id: run.run_id.clone(),
            remote_run_id: run.remote_run_id,
          });
          info!(dag_id = %run.dag_id, run_id = %run.run_id, "run succeeded");
          let ctx = run.context();
          self.observe(&run.run_id, || self.observer.on_success(&ctx));
          return run;
        }
        Err(TriggerError::Cancelled) => return self.settle_cancelled(run),
        Err(err) => err,
      };

      run.last_error = Some(err.to_string());

      if !self.retry.should_retry(run.try_number) {
        self.advance(&mut run, RunStatus::Failed);
        self.notifier.notify(ExecutionEvent::RunFailed {
          run_id: run.run_id.clone(),
          error: err.to_string(),
        });
        error!(
          dag_id = %run.dag_id,
          run_id = %run.run_id,
          try_number = run.try_number,
          error = %err,
          "run failed"
        );
        let ctx = run.context();
        let failure = RunFailure::from_error(&err);
        self.observe(&run.run_id, || self.observer.on_failure(&ctx, &failure));
        return run;
      }

      self.advance(&mut run, RunStatus::UpForRetry);
      self.notifier.notify(ExecutionEvent::RunRetrying {
        run_id: run.run_id.clone(),
        try_number: run.try_number,
        error: err.to_string(),
        delay_secs: self.retry.delay.as_secs(),
      });
      warn!(
        dag_id = %run.dag_id,
        run_id = %run.run_id,
        try_number = run.try_number,
        error = %err,
        "run attempt failed, retrying in {}s",
        self.retry.delay.as_secs()
      );

      tokio::select! {
        _ = tokio::time::sleep(self.retry.delay) => {}
        _ = cancel.cancelled() => return self.settle_cancelled(run),
      }
      self.advance(&mut run, RunStatus::Queued);
    }
  }

  fn settle_cancelled(&self, mut run: RunInstance) -> RunInstance {
    self.advance(&mut run, RunStatus::Cancelled);
    self.notifier.notify(ExecutionEvent::RunCancelled {
      run_id: run.run_id.clone(),
    });
    info!(dag_id = %run.dag_id, run_id = %run.run_id, "run cancelled");

    let ctx = run.context();
    let failure = RunFailure::new(TriggerError::Cancelled.to_string());
    self.observe(&run.run_id, || self.observer.on_failure(&ctx, &failure));
    run
  }

  /// Apply a transition the execution loop guarantees is valid.
  fn advance(&self, run: &mut RunInstance, next: RunStatus) {
    if let Err(e) = run.transition(next) {
      error!(run_id = %run.run_id, error = %e, "run state machine violated");
    }
  }

  /// Call an observer, containing any panic so it cannot change the outcome.
  fn observe(&self, run_id: &str, notify: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(notify)).is_err() {
      error!(run_id, "run observer panicked");
    }
  }
}

fn next_tick(
  ticker: Option<&mut tokio::time::Interval>,
) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
  match ticker {
    Some(interval) => Box::pin(async move {
      interval.tick().await;
    }),
    None => Box::pin(std::future::pending()),
  }
}

fn log_joined(dag_id: &str, joined: Result<RunInstance, tokio::task::JoinError>) {
  match joined {
    Ok(run) => info!(
      dag_id = %dag_id,
      run_id = %run.run_id,
      status = ?run.status,
      "dag run finished"
    ),
    Err(e) => error!(dag_id = %dag_id, error = %e, "dag run task failed"),
  }
}
