//! File discovery for directory sync.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use unisync_core::Result;
use walkdir::WalkDir;

/// Maps base name → path for every file under `dir` carrying the given
/// extension convention. Extensions may be compound ("agent.md"), so the
/// match is a `.{extension}` suffix check on the file name, and the base
/// name is everything before it.
pub fn discover(dir: &Path, extension: &str) -> Result<BTreeMap<String, PathBuf>> {
    let mut found = BTreeMap::new();
    if !dir.exists() {
        return Ok(found);
    }
    let suffix = format!(".{extension}");
    for entry in WalkDir::new(dir).min_depth(1).max_depth(8) {
        let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };
        let Some(base) = file_name.strip_suffix(&suffix) else {
            continue;
        };
        if base.is_empty() || base.starts_with('.') {
            continue;
        }
        found.insert(base.to_string(), entry.path().to_path_buf());
    }
    Ok(found)
}
