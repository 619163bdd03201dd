//! Run events and notifiers for observability.
//!
//! Events are emitted as runs move through their states so consumers can
//! persist history, stream progress to a UI, or assert on behaviour in tests.
//! They are separate from [`RunObserver`](harvest_trigger::RunObserver)
//! notifications, which only cover terminal outcomes.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted while hosting runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// A run was created and is waiting to start.
  RunQueued { run_id: String, dag_id: String },

  /// An attempt started.
  RunStarted { run_id: String, try_number: u32 },

  /// An attempt failed and will be retried after `delay_secs`.
  RunRetrying {
    run_id: String,
    try_number: u32,
    error: String,
    delay_secs: u64,
  },

  RunSucceeded {
    run_id: String,
    remote_run_id: Option<u64>,
  },

  RunFailed { run_id: String, error: String },

  RunCancelled { run_id: String },
}

/// Trait for receiving execution events.
///
/// The engine calls `notify` for each event; implementations decide what to
/// do with them.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // One event per state change, so an unbounded channel stays small.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
