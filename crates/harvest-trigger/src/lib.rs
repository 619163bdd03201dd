//! Harvest Trigger
//!
//! The pieces a trigger definition runs with:
//!
//! - [`RunNowOperator`] starts a remote Databricks job and waits for it to
//!   reach a terminal state, cancelling the remote run if the wait is
//!   cancelled.
//! - [`RunObserver`] receives exactly one terminal notification per run.
//!   [`LoggingObserver`] turns those into log records on an injected
//!   [`LogSink`](harvest_log::LogSink).
//! - [`RunRequest`] and [`RunContext`] describe an activation and the run it
//!   produced.

mod context;
mod error;
mod observer;
mod operator;
mod types;

pub use context::{RunContext, RunFailure};
pub use error::TriggerError;
pub use observer::{LoggingObserver, NoopObserver, RunObserver};
pub use operator::{RemoteRun, RunNowOperator};
pub use types::{Activation, RunRequest};
