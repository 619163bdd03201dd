//! Size-bounded rotating file writer.
//!
//! The active file is `<path>`; rotated files are `<path>.1` (newest) through
//! `<path>.<backup_count>` (oldest). Rotation happens before a write that
//! would take the active file to `max_bytes` or beyond, so a single record is
//! never split across files.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::LogError;

struct ActiveFile {
  file: File,
  len: u64,
}

/// Appends whole records to a file set, rotating by size.
///
/// Writes from any number of threads are serialized by an internal mutex.
pub struct RotatingFileWriter {
  path: PathBuf,
  max_bytes: u64,
  backup_count: usize,
  active: Mutex<Option<ActiveFile>>,
}

impl RotatingFileWriter {
  /// Create a writer, creating the parent directory if it does not exist.
  ///
  /// The file itself is opened lazily on the first write. A `max_bytes` or
  /// `backup_count` of zero disables rotation.
  pub fn new(
    path: impl Into<PathBuf>,
    max_bytes: u64,
    backup_count: usize,
  ) -> Result<Self, LogError> {
    let path = path.into();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
      fs::create_dir_all(dir).map_err(|source| LogError::CreateDir {
        path: dir.to_path_buf(),
        source,
      })?;
    }

    Ok(Self {
      path,
      max_bytes,
      backup_count,
      active: Mutex::new(None),
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Path of the `index`-th rotated file (1 is the most recent).
  pub fn backup_path(&self, index: usize) -> PathBuf {
    backup_path(&self.path, index)
  }

  /// Append one complete record.
  pub fn write_record(&self, record: &str) -> Result<(), LogError> {
    let bytes = record.as_bytes();
    let mut guard = self.active.lock();
    let active: &mut Option<ActiveFile> = &mut guard;

    let needs_rotation = active
      .as_ref()
      .is_some_and(|current| self.should_rotate(current.len, bytes.len() as u64));
    if needs_rotation {
      // Close the handle before renaming the file underneath it.
      *active = None;
      self.rotate()?;
    }

    if active.is_none() {
      let opened = self.open()?;
      if self.should_rotate(opened.len, bytes.len() as u64) {
        drop(opened);
        self.rotate()?;
        *active = Some(self.open()?);
      } else {
        *active = Some(opened);
      }
    }

    let Some(current) = active.as_mut() else {
      return Ok(());
    };

    if let Err(e) = current.file.write_all(bytes).and_then(|()| current.file.flush()) {
      // Reopen on the next write.
      *active = None;
      return Err(LogError::Write(e));
    }
    current.len += bytes.len() as u64;

    Ok(())
  }

  fn should_rotate(&self, current_len: u64, incoming: u64) -> bool {
    self.max_bytes > 0
      && self.backup_count > 0
      && current_len > 0
      && current_len + incoming >= self.max_bytes
  }

  fn open(&self) -> Result<ActiveFile, LogError> {
    let file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&self.path)
      .map_err(|source| LogError::Open {
        path: self.path.clone(),
        source,
      })?;
    let len = file
      .metadata()
      .map_err(|source| LogError::Open {
        path: self.path.clone(),
        source,
      })?
      .len();
    Ok(ActiveFile { file, len })
  }

  /// Shift `<path>.N-1 -> <path>.N`, ..., `<path> -> <path>.1`. The file at
  /// `<path>.<backup_count>` is overwritten, discarding the oldest backup.
  fn rotate(&self) -> Result<(), LogError> {
    let rotate_err = |source| LogError::Rotate {
      path: self.path.clone(),
      source,
    };

    for index in (1..self.backup_count).rev() {
      let src = self.backup_path(index);
      if src.exists() {
        let dst = self.backup_path(index + 1);
        remove_if_exists(&dst).map_err(rotate_err)?;
        fs::rename(&src, &dst).map_err(rotate_err)?;
      }
    }

    let newest = self.backup_path(1);
    remove_if_exists(&newest).map_err(rotate_err)?;
    if self.path.exists() {
      fs::rename(&self.path, &newest).map_err(rotate_err)?;
    }

    tracing::debug!(path = %self.path.display(), "rotated log file");
    Ok(())
  }
}

fn backup_path(path: &Path, index: usize) -> PathBuf {
  let mut name = path.as_os_str().to_os_string();
  name.push(format!(".{index}"));
  PathBuf::from(name)
}

fn remove_if_exists(path: &Path) -> std::io::Result<()> {
  match fs::remove_file(path) {
    Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
    _ => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(n: usize, width: usize) -> String {
    let mut line = format!("{n:06} ");
    line.push_str(&"x".repeat(width.saturating_sub(line.len() + 1)));
    line.push('\n');
    line
  }

  #[test]
  fn test_creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a/b/c/etl.log");

    let writer = RotatingFileWriter::new(&path, 1024, 3).unwrap();
    writer.write_record("hello\n").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
  }

  #[test]
  fn test_existing_directory_is_fine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("etl.log");

    RotatingFileWriter::new(&path, 1024, 3).unwrap();
    RotatingFileWriter::new(&path, 1024, 3).unwrap();
  }

  #[test]
  fn test_rotates_before_exceeding_limit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("etl.log");
    let writer = RotatingFileWriter::new(&path, 100, 3).unwrap();

    // Two 40-byte records fit, the third would reach 120 bytes.
    for n in 0..3 {
      writer.write_record(&record(n, 40)).unwrap();
    }

    let backup = fs::read_to_string(writer.backup_path(1)).unwrap();
    let active = fs::read_to_string(&path).unwrap();
    assert_eq!(backup.lines().count(), 2);
    assert_eq!(active.lines().count(), 1);
    assert!(active.starts_with("000002"));
  }

  #[test]
  fn test_keeps_at_most_backup_count_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("etl.log");
    let writer = RotatingFileWriter::new(&path, 100, 3).unwrap();

    // One record per file: every write after the first rotates.
    for n in 0..10 {
      writer.write_record(&record(n, 60)).unwrap();
    }

    assert!(path.exists());
    for index in 1..=3 {
      assert!(writer.backup_path(index).exists(), "missing backup {index}");
    }
    assert!(!writer.backup_path(4).exists());

    // Newest backup holds the previous record, oldest the one before that.
    assert!(fs::read_to_string(writer.backup_path(1)).unwrap().starts_with("000008"));
    assert!(fs::read_to_string(writer.backup_path(3)).unwrap().starts_with("000006"));
  }

  #[test]
  fn test_zero_backup_count_never_rotates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("etl.log");
    let writer = RotatingFileWriter::new(&path, 10, 0).unwrap();

    for n in 0..5 {
      writer.write_record(&record(n, 20)).unwrap();
    }

    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 5);
    assert!(!writer.backup_path(1).exists());
  }

  #[test]
  fn test_reopen_counts_existing_size() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("etl.log");
    fs::write(&path, "x".repeat(90)).unwrap();

    let writer = RotatingFileWriter::new(&path, 100, 2).unwrap();
    writer.write_record(&record(1, 20)).unwrap();

    assert_eq!(fs::read_to_string(writer.backup_path(1)).unwrap().len(), 90);
    assert!(fs::read_to_string(&path).unwrap().starts_with("000001"));
  }
}
