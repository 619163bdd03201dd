use std::path::Path;

use chrono::Utc;
use tracing::Level;

use crate::config::LogConfig;
use crate::error::LogError;
use crate::format::format_record;
use crate::rotate::RotatingFileWriter;

/// A component's log: level filter, record format and rotating file.
pub struct LogSink {
  component: String,
  min_level: Level,
  writer: RotatingFileWriter,
}

impl LogSink {
  /// Open a sink, creating its directory if needed.
  ///
  /// Prefer [`SinkRegistry::get_or_init`](crate::SinkRegistry::get_or_init),
  /// which hands out one sink per component.
  pub fn open(config: &LogConfig) -> Result<Self, LogError> {
    config.validate()?;
    let writer = RotatingFileWriter::new(config.path(), config.max_bytes, config.backup_count)?;

    Ok(Self {
      component: config.component.clone(),
      min_level: config.min_level,
      writer,
    })
  }

  pub fn component(&self) -> &str {
    &self.component
  }

  pub fn path(&self) -> &Path {
    self.writer.path()
  }

  pub fn enabled(&self, level: Level) -> bool {
    level <= self.min_level
  }

  /// Write one record at `level`. Records below the minimum level are dropped.
  pub fn record(&self, level: Level, message: &str) -> Result<(), LogError> {
    if !self.enabled(level) {
      return Ok(());
    }

    mirror(level, &self.component, message);
    let line = format_record(Utc::now(), level, &self.component, message);
    self.writer.write_record(&line)
  }

  pub fn info(&self, message: &str) -> Result<(), LogError> {
    self.record(Level::INFO, message)
  }

  pub fn warn(&self, message: &str) -> Result<(), LogError> {
    self.record(Level::WARN, message)
  }

  pub fn error(&self, message: &str) -> Result<(), LogError> {
    self.record(Level::ERROR, message)
  }
}

impl std::fmt::Debug for LogSink {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LogSink")
      .field("component", &self.component)
      .field("path", &self.writer.path())
      .field("min_level", &self.min_level)
      .finish()
  }
}

/// Forward the record to the process subscriber as well.
fn mirror(level: Level, component: &str, message: &str) {
  match level {
    Level::ERROR => tracing::error!(component, "{message}"),
    Level::WARN => tracing::warn!(component, "{message}"),
    Level::INFO => tracing::info!(component, "{message}"),
    Level::DEBUG => tracing::debug!(component, "{message}"),
    _ => tracing::trace!(component, "{message}"),
  }
}
