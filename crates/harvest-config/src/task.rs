use serde::{Deserialize, Serialize};

/// A task that asks the remote platform to run an existing job now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunNowTaskDef {
  pub task_id: String,

  /// Connection name, resolved to a host and credentials outside the definition.
  #[serde(default = "default_connection_id")]
  pub connection_id: String,

  /// Numeric id of a job already provisioned on the remote platform.
  pub job_id: u64,

  /// Seconds between run status polls.
  #[serde(default = "default_polling_period_secs")]
  pub polling_period_secs: u64,
}

pub(crate) fn default_connection_id() -> String {
  "databricks_default".to_string()
}

pub(crate) fn default_polling_period_secs() -> u64 {
  30
}
