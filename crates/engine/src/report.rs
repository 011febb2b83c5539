//! Reporting types for sync runs.

use serde::Serialize;
use std::path::PathBuf;
use unisync_core::{DecisionAction, MergeDecision};

/// Outcome of one source/target pair.
#[derive(Debug, Clone, Serialize)]
pub struct PairReport {
    pub source: PathBuf,
    pub target: PathBuf,
    pub decisions: Vec<MergeDecision>,
    pub warnings: Vec<String>,
    /// False for dry runs and no-op pairs.
    pub written: bool,
    /// Unified diff of the pending target change, dry runs only.
    pub diff: Option<String>,
}

impl PairReport {
    pub fn count(&self, action: DecisionAction) -> usize {
        self.decisions
            .iter()
            .filter(|d| d.action == action)
            .count()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// True when every decision left the target as it was.
    pub fn is_noop(&self) -> bool {
        self.decisions
            .iter()
            .all(|d| d.action == DecisionAction::Unchanged)
    }
}

/// Reasons a directory entry was not synced.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum SkipReason {
    /// Present on the target side only; nothing to merge from.
    TargetOnly { name: String },
    /// Source file failed to parse; sibling pairs continued.
    ParseError { name: String, error: String },
}

impl SkipReason {
    pub fn description(&self) -> String {
        match self {
            Self::TargetOnly { name } => {
                format!("{name}: exists only on the target side")
            }
            Self::ParseError { name, error } => format!("{name}: {error}"),
        }
    }
}

/// Aggregate outcome of a directory sync.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub pairs: Vec<PairReport>,
    pub skipped: Vec<SkipReason>,
    pub dry_run: bool,
}

impl RunReport {
    pub fn total(&self, action: DecisionAction) -> usize {
        self.pairs.iter().map(|p| p.count(action)).sum()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.pairs
            .iter()
            .flat_map(|p| p.warnings.iter())
            .map(String::as_str)
    }

    pub fn format_summary(&self) -> String {
        let mut out = String::new();
        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        out.push_str(&format!(
            "{prefix}{} pair(s): {} added, {} updated, {} unchanged, {} downgraded, {} dropped\n",
            self.pairs.len(),
            self.total(DecisionAction::Added),
            self.total(DecisionAction::Updated),
            self.total(DecisionAction::Unchanged),
            self.total(DecisionAction::LossyDowngrade),
            self.total(DecisionAction::Dropped),
        ));
        for skip in &self.skipped {
            out.push_str(&format!("skipped {}\n", skip.description()));
        }
        for warning in self.warnings() {
            out.push_str(&format!("warning: {warning}\n"));
        }
        out
    }
}
