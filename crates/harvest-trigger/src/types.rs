use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What caused a run to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
  /// Requested by a user or API call.
  Manual,

  /// Created by the definition's schedule.
  Scheduled,
}

/// A request to activate a definition once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
  /// Unique identifier for this request, reused as the run id.
  pub request_id: String,

  pub activation: Activation,

  pub requested_at: DateTime<Utc>,
}

impl RunRequest {
  pub fn manual() -> Self {
    Self::new(Activation::Manual)
  }

  pub fn scheduled() -> Self {
    Self::new(Activation::Scheduled)
  }

  fn new(activation: Activation) -> Self {
    Self {
      request_id: uuid::Uuid::new_v4().to_string(),
      activation,
      requested_at: Utc::now(),
    }
  }
}
