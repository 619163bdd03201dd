use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::config::LogConfig;
use crate::error::LogError;
use crate::sink::LogSink;

static GLOBAL: OnceLock<SinkRegistry> = OnceLock::new();

/// One [`LogSink`] per component name.
///
/// Initialization is idempotent: the first `get_or_init` for a component
/// opens the sink, later calls return that same sink and ignore their config.
#[derive(Default)]
pub struct SinkRegistry {
  sinks: Mutex<HashMap<String, Arc<LogSink>>>,
}

impl SinkRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// The process-wide registry.
  pub fn global() -> &'static SinkRegistry {
    GLOBAL.get_or_init(SinkRegistry::new)
  }

  pub fn get_or_init(&self, config: &LogConfig) -> Result<Arc<LogSink>, LogError> {
    let mut sinks = self.sinks.lock();

    if let Some(existing) = sinks.get(&config.component) {
      if existing.path() != config.path() {
        tracing::warn!(
          component = %config.component,
          existing = %existing.path().display(),
          requested = %config.path().display(),
          "log sink already initialized, keeping existing file"
        );
      }
      return Ok(existing.clone());
    }

    let sink = Arc::new(LogSink::open(config)?);
    sinks.insert(config.component.clone(), sink.clone());
    tracing::debug!(
      component = %config.component,
      path = %sink.path().display(),
      "log sink initialized"
    );
    Ok(sink)
  }

  pub fn get(&self, component: &str) -> Option<Arc<LogSink>> {
    self.sinks.lock().get(component).cloned()
  }

  pub fn len(&self) -> usize {
    self.sinks.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.sinks.lock().is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_repeated_init_returns_same_sink() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SinkRegistry::new();
    let config = LogConfig::new(dir.path(), "etl");

    let first = registry.get_or_init(&config).unwrap();
    let second = registry.get_or_init(&config).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.len(), 1);
  }

  #[test]
  fn test_components_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SinkRegistry::new();

    registry.get_or_init(&LogConfig::new(dir.path(), "a")).unwrap();
    registry.get_or_init(&LogConfig::new(dir.path(), "b")).unwrap();

    assert_eq!(registry.len(), 2);
    assert!(registry.get("a").is_some());
    assert!(registry.get("c").is_none());
  }

  #[test]
  fn test_global_is_shared() {
    assert!(std::ptr::eq(SinkRegistry::global(), SinkRegistry::global()));
  }
}
