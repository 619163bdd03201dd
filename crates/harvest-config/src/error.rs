use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("invalid job id: {0} (must be a positive integer)")]
  InvalidJobId(u64),

  #[error("duplicate tag: {0}")]
  DuplicateTag(String),

  #[error("invalid schedule: {0}")]
  InvalidSchedule(String),

  #[error("failed to read definition: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to parse definition: {0}")]
  Parse(#[from] serde_json::Error),
}
