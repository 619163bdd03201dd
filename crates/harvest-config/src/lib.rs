//! Harvest Config
//!
//! This crate contains the serializable trigger definition types for Harvest.
//! A definition names a DAG, carries its default execution arguments, an
//! optional schedule, discovery tags, and the single run-now task that
//! invokes a remote Databricks job.
//!
//! Definitions can be loaded from:
//! - JSON files (via CLI with `--definition=dag.json`)
//! - the built-in [`agricultural_crop_production`] definition
//!
//! Success and failure callbacks are not part of the serialized form. They
//! are supplied to the runner as a run observer.

mod builtin;
mod dag;
mod error;
mod schedule;
mod task;

pub use builtin::{
  AGRICULTURAL_DAG_ID, AGRICULTURAL_JOB_ID, AGRICULTURAL_TASK_ID, agricultural_crop_production,
};
pub use dag::{DagDef, DefaultArgs};
pub use error::ConfigError;
pub use schedule::Schedule;
pub use task::RunNowTaskDef;
