//! Sync orchestration across a pair of format adapters.
//!
//! One invocation runs READ → MERGE → GATE → WRITE → COMMIT for a file
//! pair; in bidirectional mode both directions are merged and gated
//! before either side is written, so strict mode is all-or-nothing
//! across the whole invocation.

use crate::discovery::discover;
use crate::report::{PairReport, RunReport, SkipReason};
use parking_lot::Mutex;
use rayon::prelude::*;
use similar::TextDiff;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use unisync_core::{
    enforce_strict, evaluate, fsio, merge_records, CanonicalRecord, ConfigKind, FormatAdapter,
    MergeDecision, Result, SnapshotPair, SyncError,
};
use unisync_state::{fingerprint, now_rfc3339, pair_id, PairEntry, SyncStateStore};

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    pub bidirectional: bool,
    pub dry_run: bool,
    pub strict: bool,
}

/// Drives sync operations between one source and one target format for a
/// fixed record kind. State-store access is serialized so directory sync
/// can fan pairs out across a thread pool.
pub struct SyncOrchestrator<'a> {
    source: &'a dyn FormatAdapter,
    target: &'a dyn FormatAdapter,
    kind: ConfigKind,
    state: Mutex<SyncStateStore>,
    options: SyncOptions,
}

struct Loaded {
    content: Option<String>,
    record: Option<CanonicalRecord>,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(
        source: &'a dyn FormatAdapter,
        target: &'a dyn FormatAdapter,
        kind: ConfigKind,
        state: SyncStateStore,
        options: SyncOptions,
    ) -> Result<Self> {
        for adapter in [source, target] {
            adapter.ensure_supported(kind)?;
        }
        Ok(Self {
            source,
            target,
            kind,
            state: Mutex::new(state),
            options,
        })
    }

    pub fn options(&self) -> SyncOptions {
        self.options
    }

    fn load(&self, adapter: &dyn FormatAdapter, path: &Path) -> Result<Loaded> {
        if !path.exists() {
            return Ok(Loaded {
                content: None,
                record: None,
            });
        }
        let content = fs::read_to_string(path)?;
        let mut record = adapter.parse(self.kind, &content, path)?;
        record.set_source_format(adapter.name());
        record.validate()?;
        Ok(Loaded {
            content: Some(content),
            record: Some(record),
        })
    }

    /// Snapshot oriented so that `source` matches this invocation's
    /// source side, whichever direction the pair was last synced in.
    fn snapshot_for(&self, id: &str, source_path: &Path) -> Option<SnapshotPair> {
        let state = self.state.lock();
        let entry = state.lookup(id)?;
        let snapshot = if entry.source_path == source_path.display().to_string() {
            entry.snapshot.clone()
        } else {
            SnapshotPair {
                source: entry.snapshot.target.clone(),
                target: entry.snapshot.source.clone(),
            }
        };
        Some(snapshot)
    }

    fn unified_diff(old: &str, new: &str, path: &Path) -> String {
        let name = path.display().to_string();
        TextDiff::from_lines(old, new)
            .unified_diff()
            .header(&format!("a/{name}"), &format!("b/{name}"))
            .to_string()
    }

    /// In-place sync of one file pair, with optional reverse leg.
    pub fn sync_files_in_place(
        &self,
        source_path: &Path,
        target_path: &Path,
    ) -> Result<PairReport> {
        self.sync_pair(source_path, target_path, self.options.dry_run, self.options.strict)
    }

    fn sync_pair(
        &self,
        source_path: &Path,
        target_path: &Path,
        dry_run: bool,
        strict: bool,
    ) -> Result<PairReport> {
        let source_content = fs::read_to_string(source_path)?;
        let mut source_record = self.source.parse(self.kind, &source_content, source_path)?;
        source_record.set_source_format(self.source.name());
        source_record.validate()?;

        let target_loaded = self.load(self.target, target_path)?;

        let id = pair_id(source_path, self.source.name(), target_path, self.target.name());
        let snapshot = self.snapshot_for(&id, source_path);

        let (merged_target, mut decisions) = merge_records(
            snapshot.as_ref(),
            &source_record,
            target_loaded.record.as_ref(),
            self.target.name(),
            &self.target.field_support(self.kind),
        )?;

        // Reverse leg: merge the current target back into the source,
        // using the snapshot with its sides swapped. Computed before any
        // write so the gate sees both directions.
        let mut merged_source = source_record.clone();
        if self.options.bidirectional {
            if let Some(target_record) = &target_loaded.record {
                let reverse_snapshot = snapshot.as_ref().map(|s| SnapshotPair {
                    source: s.target.clone(),
                    target: s.source.clone(),
                });
                let (merged, reverse_decisions) = merge_records(
                    reverse_snapshot.as_ref(),
                    target_record,
                    Some(&source_record),
                    self.source.name(),
                    &self.source.field_support(self.kind),
                )?;
                merged_source = merged;
                decisions.extend(reverse_decisions);
            }
        }

        let verdict = evaluate(&decisions);
        enforce_strict(strict, &verdict)?;
        for warning in verdict.warnings() {
            warn!(pair = %id, "{warning}");
        }

        let pending_target = self.target.render(&merged_target)?;
        let old_target = target_loaded.content.as_deref().unwrap_or("");

        if dry_run {
            return Ok(PairReport {
                source: source_path.to_path_buf(),
                target: target_path.to_path_buf(),
                diff: Some(Self::unified_diff(old_target, &pending_target, target_path)),
                warnings: verdict.warnings().to_vec(),
                decisions,
                written: false,
            });
        }

        let mut written = false;
        if pending_target != old_target {
            fsio::write_atomic(target_path, &pending_target)?;
            written = true;
        }

        let mut final_source = source_content;
        if self.options.bidirectional {
            let pending_source = self.source.render(&merged_source)?;
            if pending_source != final_source {
                fsio::write_atomic(source_path, &pending_source)?;
                written = true;
            }
            final_source = pending_source;
        }

        debug!(pair = %id, written, "pair committed");
        self.state.lock().record(
            id,
            PairEntry {
                source_path: source_path.display().to_string(),
                target_path: target_path.display().to_string(),
                source_fingerprint: fingerprint(&final_source),
                target_fingerprint: fingerprint(&pending_target),
                last_synced_at: now_rfc3339(),
                snapshot: SnapshotPair {
                    source: merged_source,
                    target: merged_target,
                },
            },
        );

        Ok(PairReport {
            source: source_path.to_path_buf(),
            target: target_path.to_path_buf(),
            warnings: verdict.warnings().to_vec(),
            decisions,
            written,
            diff: None,
        })
    }

    /// One-shot conversion: no target read, no snapshot, no state.
    pub fn convert_file(&self, source_path: &Path, target_path: &Path) -> Result<PairReport> {
        let source_content = fs::read_to_string(source_path)?;
        let mut source_record = self.source.parse(self.kind, &source_content, source_path)?;
        source_record.set_source_format(self.source.name());
        source_record.validate()?;

        let (converted, decisions) = merge_records(
            None,
            &source_record,
            None,
            self.target.name(),
            &self.target.field_support(self.kind),
        )?;

        let verdict = evaluate(&decisions);
        enforce_strict(self.options.strict, &verdict)?;
        for warning in verdict.warnings() {
            warn!(source = %source_path.display(), "{warning}");
        }

        let pending = self.target.render(&converted)?;
        if self.options.dry_run {
            return Ok(PairReport {
                source: source_path.to_path_buf(),
                target: target_path.to_path_buf(),
                diff: Some(Self::unified_diff("", &pending, target_path)),
                warnings: verdict.warnings().to_vec(),
                decisions,
                written: false,
            });
        }

        fsio::write_atomic(target_path, &pending)?;
        Ok(PairReport {
            source: source_path.to_path_buf(),
            target: target_path.to_path_buf(),
            warnings: verdict.warnings().to_vec(),
            decisions,
            written: true,
            diff: None,
        })
    }

    /// Syncs two directory trees by base name.
    ///
    /// Pairs are independent and run on the rayon pool; one pair's parse
    /// failure is reported and siblings continue. Strict mode first runs
    /// every pair as a dry probe and aborts before any write if the
    /// union of decisions carries a warning.
    pub fn sync_directories(&self, source_dir: &Path, target_dir: &Path) -> Result<RunReport> {
        if self.kind == ConfigKind::Permission {
            return Err(SyncError::Validation {
                kind: self.kind,
                message: "permission documents are single files; use an in-place file sync"
                    .to_string(),
            });
        }

        let source_ext = self.source.file_extension(self.kind);
        let target_ext = self.target.file_extension(self.kind);
        let sources = discover(source_dir, source_ext)?;
        let targets = discover(target_dir, target_ext)?;

        let mut skipped: Vec<SkipReason> = targets
            .keys()
            .filter(|name| !sources.contains_key(*name))
            .map(|name| SkipReason::TargetOnly { name: name.clone() })
            .collect();

        let pairs: Vec<(String, std::path::PathBuf, std::path::PathBuf)> = sources
            .into_iter()
            .map(|(name, source_path)| {
                let target_path = targets
                    .get(&name)
                    .cloned()
                    .unwrap_or_else(|| target_dir.join(format!("{name}.{target_ext}")));
                (name, source_path, target_path)
            })
            .collect();

        if self.options.strict {
            // Probe pass: compute every pair's decisions without writing,
            // and gate over the union before the real pass starts.
            let probes: Vec<Result<PairReport>> = pairs
                .par_iter()
                .map(|(_, source_path, target_path)| {
                    self.sync_pair(source_path, target_path, true, false)
                })
                .collect();
            let mut all_warnings = Vec::new();
            for probe in probes {
                all_warnings.extend(probe?.warnings);
            }
            if !all_warnings.is_empty() {
                return Err(SyncError::StrictMode {
                    warnings: all_warnings,
                });
            }
        }

        let outcomes: Vec<(String, Result<PairReport>)> = pairs
            .par_iter()
            .map(|(name, source_path, target_path)| {
                let report =
                    self.sync_pair(source_path, target_path, self.options.dry_run, false);
                (name.clone(), report)
            })
            .collect();

        let mut report = RunReport {
            dry_run: self.options.dry_run,
            ..Default::default()
        };
        for (name, outcome) in outcomes {
            match outcome {
                Ok(pair) => report.pairs.push(pair),
                Err(err) if self.options.strict => return Err(err),
                Err(err) => {
                    warn!(%name, %err, "pair failed; continuing");
                    skipped.push(SkipReason::ParseError {
                        name,
                        error: err.to_string(),
                    });
                }
            }
        }
        report.skipped = skipped;
        Ok(report)
    }

    /// Flushes the state store. A no-op for dry runs.
    pub fn finish(&self) -> Result<()> {
        if self.options.dry_run {
            return Ok(());
        }
        self.state.lock().flush()
    }
}

/// Convenience for callers that only need warning text from decisions.
pub fn warning_messages(decisions: &[MergeDecision]) -> Vec<String> {
    decisions
        .iter()
        .filter(|d| d.is_warning())
        .map(|d| d.describe())
        .collect()
}
