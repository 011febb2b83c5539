//! JSON-backed store of per-pair fingerprints and snapshots.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::warn;
use unisync_core::{Result, SnapshotPair, SyncError};

/// Everything remembered about one synced file pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairEntry {
    pub source_path: String,
    pub target_path: String,
    pub source_fingerprint: String,
    pub target_fingerprint: String,
    pub last_synced_at: String,
    pub snapshot: SnapshotPair,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    sync_pairs: BTreeMap<String, PairEntry>,
}

/// Loads, mutates and atomically flushes the state file.
///
/// A missing or unreadable state file degrades to an empty store: the
/// next sync simply runs without deletion propagation, it never fails.
#[derive(Debug)]
pub struct SyncStateStore {
    path: PathBuf,
    file: StateFile,
}

impl SyncStateStore {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(file) => file,
                Err(err) => {
                    warn!(path = %path.display(), %err, "state file is corrupt; starting empty");
                    StateFile::default()
                }
            },
            Err(_) => StateFile::default(),
        };
        Self { path, file }
    }

    /// `~/.unisync/state.json`, or a relative fallback when the home
    /// directory cannot be determined.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".unisync")
            .join("state.json")
    }

    pub fn lookup(&self, pair_id: &str) -> Option<&PairEntry> {
        self.file.sync_pairs.get(pair_id)
    }

    pub fn record(&mut self, pair_id: impl Into<String>, entry: PairEntry) {
        self.file.sync_pairs.insert(pair_id.into(), entry);
    }

    pub fn remove(&mut self, pair_id: &str) -> Option<PairEntry> {
        self.file.sync_pairs.remove(pair_id)
    }

    pub fn len(&self) -> usize {
        self.file.sync_pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.sync_pairs.is_empty()
    }

    /// Writes the store to disk via a temp file rename.
    pub fn flush(&self) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;
        let tmp = NamedTempFile::new_in(parent)?;
        let content = serde_json::to_string_pretty(&self.file).map_err(|e| {
            SyncError::parse(format!("failed to serialize state: {e}"))
        })?;
        fs::write(tmp.path(), content)?;
        tmp.persist(&self.path).map_err(|e| SyncError::Write {
            path: self.path.clone(),
            source: e.error,
        })?;
        Ok(())
    }
}

/// Direction-independent identifier for a file pair: both endpoints are
/// rendered as `path[format]` and joined in lexical order, so swapping
/// source and target on the command line finds the same entry.
pub fn pair_id(a_path: &Path, a_format: &str, b_path: &Path, b_format: &str) -> String {
    let a = format!("{}[{}]", a_path.display(), a_format);
    let b = format!("{}[{}]", b_path.display(), b_format);
    if a <= b {
        format!("{a}|{b}")
    } else {
        format!("{b}|{a}")
    }
}

/// SHA-256 hex digest of raw file content.
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Current UTC time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
