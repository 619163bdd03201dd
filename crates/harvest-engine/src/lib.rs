//! Harvest Engine
//!
//! This crate hosts a trigger definition: it turns activations into runs,
//! drives each run through its state machine and reports the outcome.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        DagRunner                            │
//! │  - owns mpsc channel of RunRequests (sender + receiver)     │
//! │  - trigger() requests a manual run                          │
//! │  - start(cancel) runs the activation loop + interval ticks  │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       RunInstance                           │
//! │  - queued → running → succeeded | failed | cancelled        │
//! │  - running → up_for_retry → queued per RetryPolicy          │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │            RunNowOperator / RunObserver                     │
//! │  - remote job submission and wait                           │
//! │  - exactly one terminal notification per run                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod error;
mod events;
mod retry;
mod runner;
mod state;

pub use error::EngineError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use retry::RetryPolicy;
pub use runner::DagRunner;
pub use state::{RunInstance, RunStatus};
