use std::fmt;

use url::Url;

use crate::error::DatabricksError;

/// A resolved workspace connection.
#[derive(Clone)]
pub struct Connection {
  pub host: Url,
  pub token: String,
}

impl Connection {
  /// Build a connection, accepting hosts with or without a scheme.
  pub fn new(host: &str, token: impl Into<String>) -> Result<Self, DatabricksError> {
    let trimmed = host.trim().trim_end_matches('/');
    let with_scheme = if trimmed.contains("://") {
      trimmed.to_string()
    } else {
      format!("https://{trimmed}")
    };

    let mut host = Url::parse(&with_scheme).map_err(|source| DatabricksError::InvalidHost {
      host: host.to_string(),
      source,
    })?;
    // API paths are joined relative to the host, so any path prefix must end in '/'.
    if !host.path().ends_with('/') {
      let path = format!("{}/", host.path());
      host.set_path(&path);
    }

    Ok(Self {
      host,
      token: token.into(),
    })
  }
}

impl fmt::Debug for Connection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Connection")
      .field("host", &self.host.as_str())
      .field("token", &"<redacted>")
      .finish()
  }
}

/// Looks up a connection by its name.
pub trait ConnectionResolver: Send + Sync {
  fn resolve(&self, connection_id: &str) -> Result<Connection, DatabricksError>;
}

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves connections from environment variables.
///
/// Connection `databricks_default` reads `HARVEST_CONN_DATABRICKS_DEFAULT_HOST`
/// and `HARVEST_CONN_DATABRICKS_DEFAULT_TOKEN`, falling back to
/// `DATABRICKS_HOST` and `DATABRICKS_TOKEN`.
pub struct EnvConnectionResolver {
  lookup: Lookup,
}

impl EnvConnectionResolver {
  pub fn new() -> Self {
    Self::with_lookup(|key| std::env::var(key).ok())
  }

  /// Use a custom variable source instead of the process environment.
  pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
    Self {
      lookup: Box::new(lookup),
    }
  }

  fn var(&self, connection_id: &str, suffix: &str) -> Result<String, DatabricksError> {
    let prefix = connection_id.to_ascii_uppercase().replace(['-', '.'], "_");
    let scoped = format!("HARVEST_CONN_{prefix}_{suffix}");
    let fallback = format!("DATABRICKS_{suffix}");

    (self.lookup)(&scoped)
      .or_else(|| (self.lookup)(&fallback))
      .filter(|value| !value.trim().is_empty())
      .ok_or_else(|| DatabricksError::MissingConnection {
        connection_id: connection_id.to_string(),
        missing: format!("{scoped} or {fallback}"),
      })
  }
}

impl Default for EnvConnectionResolver {
  fn default() -> Self {
    Self::new()
  }
}

impl ConnectionResolver for EnvConnectionResolver {
  fn resolve(&self, connection_id: &str) -> Result<Connection, DatabricksError> {
    let host = self.var(connection_id, "HOST")?;
    let token = self.var(connection_id, "TOKEN")?;
    Connection::new(&host, token)
  }
}
