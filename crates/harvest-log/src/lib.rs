//! Harvest Log
//!
//! File-backed log sink for run notifications. Each record is one
//! `timestamp | LEVEL | component | message` entry appended to a size-bounded
//! rotating file set.
//!
//! # Architecture
//!
//! ```text
//! SinkRegistry (process-wide via SinkRegistry::global)
//! └── get_or_init(config) -> Arc<LogSink>   one sink per component name
//!
//! LogSink
//! ├── info / error / record                 format + level filter
//! └── RotatingFileWriter                    mutex-serialized appends, rotation
//! ```
//!
//! Re-initializing a component returns the sink that already exists, so
//! reloading a definition never attaches a second writer to the same file.

mod config;
mod error;
mod format;
mod registry;
mod rotate;
mod sink;

pub use config::{DEFAULT_BACKUP_COUNT, DEFAULT_MAX_BYTES, LogConfig};
pub use error::LogError;
pub use format::format_record;
pub use registry::SinkRegistry;
pub use rotate::RotatingFileWriter;
pub use sink::LogSink;
pub use tracing::Level;
