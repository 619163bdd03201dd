//! Harvest Databricks
//!
//! A small client for the Databricks Jobs 2.1 REST API covering the calls a
//! run-now trigger needs:
//!
//! - `POST /api/2.1/jobs/run-now` starts a run of an existing job
//! - `GET /api/2.1/jobs/runs/get` reports the run's life-cycle and result state
//! - `POST /api/2.1/jobs/runs/cancel` asks the platform to stop a run
//!
//! The [`JobsApi`] trait is the seam the trigger depends on; [`DatabricksClient`]
//! is the HTTP implementation. Connections are looked up by name through a
//! [`ConnectionResolver`].

mod client;
mod connection;
mod error;
mod types;

pub use client::{DatabricksClient, JobsApi};
pub use connection::{Connection, ConnectionResolver, EnvConnectionResolver};
pub use error::DatabricksError;
pub use types::{JobId, LifeCycleState, ResultState, Run, RunId, RunNowResponse, RunState};
