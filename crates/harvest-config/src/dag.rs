use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::schedule::Schedule;
use crate::task::RunNowTaskDef;

/// Execution arguments applied to every task of a DAG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultArgs {
  pub owner: String,
  #[serde(default)]
  pub depends_on_past: bool,
  /// Automatic retries after the first failed attempt.
  #[serde(default)]
  pub retries: u32,
  #[serde(default)]
  pub retry_delay_secs: u64,
}

impl DefaultArgs {
  pub fn retry_delay(&self) -> Duration {
    Duration::from_secs(self.retry_delay_secs)
  }
}

/// A trigger definition: one DAG wrapping one run-now task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagDef {
  pub dag_id: String,
  #[serde(default)]
  pub description: String,
  pub default_args: DefaultArgs,
  pub start_date: NaiveDate,
  /// `None` means the DAG only runs when activated manually.
  #[serde(default)]
  pub schedule: Option<Schedule>,
  #[serde(default)]
  pub catchup: bool,
  #[serde(default)]
  pub tags: Vec<String>,
  pub task: RunNowTaskDef,
}

impl DagDef {
  /// Parse and validate a definition from JSON.
  pub fn from_json(json: &str) -> Result<Self, ConfigError> {
    let def: DagDef = serde_json::from_str(json)?;
    def.validate()?;
    Ok(def)
  }

  /// Read, parse and validate a definition file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    Self::from_json(&content)
  }

  pub fn is_manual(&self) -> bool {
    self.schedule.is_none()
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.dag_id.trim().is_empty() {
      return Err(ConfigError::MissingField("dag_id"));
    }
    if self.default_args.owner.trim().is_empty() {
      return Err(ConfigError::MissingField("default_args.owner"));
    }
    if self.task.task_id.trim().is_empty() {
      return Err(ConfigError::MissingField("task.task_id"));
    }
    if self.task.connection_id.trim().is_empty() {
      return Err(ConfigError::MissingField("task.connection_id"));
    }
    if self.task.job_id == 0 {
      return Err(ConfigError::InvalidJobId(self.task.job_id));
    }
    if let Some(Schedule::Interval { every_secs: 0 }) = self.schedule {
      return Err(ConfigError::InvalidSchedule(
        "interval must be at least one second".to_string(),
      ));
    }
    if self.catchup {
      return Err(ConfigError::InvalidSchedule(
        "catchup is not supported".to_string(),
      ));
    }

    let mut seen = HashSet::new();
    for tag in &self.tags {
      if !seen.insert(tag.as_str()) {
        return Err(ConfigError::DuplicateTag(tag.clone()));
      }
    }

    Ok(())
  }
}
