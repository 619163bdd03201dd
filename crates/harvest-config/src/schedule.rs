use std::time::Duration;

use serde::{Deserialize, Serialize};

/// When a DAG is activated automatically.
///
/// A definition without a schedule is manual-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schedule {
  /// Activate once every `every_secs` seconds.
  Interval { every_secs: u64 },
}

impl Schedule {
  pub fn interval(&self) -> Duration {
    match self {
      Schedule::Interval { every_secs } => Duration::from_secs(*every_secs),
    }
  }
}
