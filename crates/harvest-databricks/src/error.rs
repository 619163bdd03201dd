use thiserror::Error;

/// Errors talking to the Databricks Jobs API.
#[derive(Debug, Error)]
pub enum DatabricksError {
  /// The connection name could not be resolved to a host and token.
  #[error("connection '{connection_id}' is not configured: missing {missing}")]
  MissingConnection {
    connection_id: String,
    missing: String,
  },

  #[error("invalid workspace host '{host}': {source}")]
  InvalidHost {
    host: String,
    #[source]
    source: url::ParseError,
  },

  /// The request could not be sent or the response could not be read.
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The API answered with a non-success status.
  #[error("databricks api error ({status}) {error_code}: {message}")]
  Api {
    status: u16,
    error_code: String,
    message: String,
  },
}

impl DatabricksError {
  /// Whether retrying the same call could plausibly succeed.
  pub fn is_transient(&self) -> bool {
    match self {
      DatabricksError::Http(e) => e.is_timeout() || e.is_connect(),
      DatabricksError::Api { status, .. } => *status == 429 || *status >= 500,
      DatabricksError::MissingConnection { .. } | DatabricksError::InvalidHost { .. } => false,
    }
  }
}
