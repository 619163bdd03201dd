//! Terminal run notifications.

use std::sync::Arc;

use harvest_log::LogSink;
use tracing::warn;

use crate::context::{RunContext, RunFailure};

/// Receives the terminal outcome of each run.
///
/// Exactly one of the two methods is called per run. Both run on the
/// completion path and must not panic; anything that can fail inside an
/// implementation is handled there.
pub trait RunObserver: Send + Sync {
  fn on_success(&self, ctx: &RunContext);

  fn on_failure(&self, ctx: &RunContext, failure: &RunFailure);
}

impl<T: RunObserver + ?Sized> RunObserver for Arc<T> {
  fn on_success(&self, ctx: &RunContext) {
    (**self).on_success(ctx)
  }

  fn on_failure(&self, ctx: &RunContext, failure: &RunFailure) {
    (**self).on_failure(ctx, failure)
  }
}

/// An observer that ignores all notifications.
#[derive(Debug, Clone, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {
  fn on_success(&self, _ctx: &RunContext) {}

  fn on_failure(&self, _ctx: &RunContext, _failure: &RunFailure) {}
}

/// Writes one log record per terminal notification.
#[derive(Debug, Clone)]
pub struct LoggingObserver {
  sink: Arc<LogSink>,
}

impl LoggingObserver {
  pub fn new(sink: Arc<LogSink>) -> Self {
    Self { sink }
  }

  pub fn sink(&self) -> &Arc<LogSink> {
    &self.sink
  }
}

impl RunObserver for LoggingObserver {
  fn on_success(&self, ctx: &RunContext) {
    let message = format!(
      "Task {} completed successfully for DAG {}",
      ctx.task_id, ctx.dag_id
    );
    if let Err(e) = self.sink.info(&message) {
      warn!(run_id = %ctx.run_id, error = %e, "dropped success record");
    }
  }

  fn on_failure(&self, ctx: &RunContext, failure: &RunFailure) {
    let message = format!(
      "Task {} failed for DAG {}\n{}",
      ctx.task_id,
      ctx.dag_id,
      failure.trace()
    );
    if let Err(e) = self.sink.error(&message) {
      warn!(run_id = %ctx.run_id, error = %e, "dropped failure record");
    }
  }
}
