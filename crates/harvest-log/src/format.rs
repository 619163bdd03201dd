use chrono::{DateTime, Utc};
use tracing::Level;

/// Render one record as `timestamp | LEVEL | component | message\n`.
///
/// Multi-line messages keep their extra lines (a captured error chain, for
/// example) inside the same record.
pub fn format_record(at: DateTime<Utc>, level: Level, component: &str, message: &str) -> String {
  let mut line = format!(
    "{} | {} | {} | {}",
    at.format("%Y-%m-%d %H:%M:%S,%3f"),
    level_name(level),
    component,
    message.trim_end()
  );
  line.push('\n');
  line
}

fn level_name(level: Level) -> &'static str {
  if level == Level::WARN {
    "WARNING"
  } else {
    level.as_str()
  }
}
