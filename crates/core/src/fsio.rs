//! Atomic file writes.

use crate::error::{Result, SyncError};
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes `content` to `path` via a temp file in the same directory,
/// then persists it over the destination. Readers never observe a
/// half-written file; missing parent directories are created.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)?;
    }
    let tmp = NamedTempFile::new_in(if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    })?;
    fs::write(tmp.path(), content)?;
    tmp.persist(path).map_err(|e| SyncError::Write {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
