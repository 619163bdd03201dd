use std::path::{Path, PathBuf};

use tracing::Level;

/// Active file size that triggers rotation: 5 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Rotated files kept next to the active one.
pub const DEFAULT_BACKUP_COUNT: usize = 3;

/// Where and how a component's records are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
  pub dir: PathBuf,
  pub file_name: String,
  /// Name written in every record and used as the registry key.
  pub component: String,
  pub max_bytes: u64,
  pub backup_count: usize,
  /// Least severe level that is written.
  pub min_level: Level,
}

impl LogConfig {
  pub fn new(dir: impl Into<PathBuf>, component: impl Into<String>) -> Self {
    let component = component.into();
    Self {
      dir: dir.into(),
      file_name: format!("{component}.log"),
      component,
      max_bytes: DEFAULT_MAX_BYTES,
      backup_count: DEFAULT_BACKUP_COUNT,
      min_level: Level::INFO,
    }
  }

  pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
    self.max_bytes = max_bytes;
    self
  }

  pub fn with_backup_count(mut self, backup_count: usize) -> Self {
    self.backup_count = backup_count;
    self
  }

  pub fn with_min_level(mut self, level: Level) -> Self {
    self.min_level = level;
    self
  }

  pub fn path(&self) -> PathBuf {
    self.dir.join(&self.file_name)
  }

  pub(crate) fn validate(&self) -> Result<(), crate::LogError> {
    if self.component.trim().is_empty() {
      return Err(crate::LogError::InvalidConfig(
        "component name must not be empty".to_string(),
      ));
    }
    if self.file_name.is_empty() || Path::new(&self.file_name).file_name().is_none() {
      return Err(crate::LogError::InvalidConfig(format!(
        "invalid log file name: '{}'",
        self.file_name
      )));
    }
    Ok(())
  }
}

impl Default for LogConfig {
  fn default() -> Self {
    Self::new("/opt/airflow/logs/agricultural_crop_etl", "agricultural_crop_etl")
  }
}
