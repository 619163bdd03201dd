use std::path::PathBuf;

/// Errors raised while opening or writing the log file set.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
  #[error("failed to create log directory {path}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to open log file {path}")]
  Open {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to rotate log file {path}")]
  Rotate {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to write log record")]
  Write(#[source] std::io::Error),

  #[error("invalid log configuration: {0}")]
  InvalidConfig(String),
}
