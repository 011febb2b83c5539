//! All-or-nothing gating of lossy conversions.
//!
//! The gate inspects a full decision set before anything touches disk.
//! In strict mode a single warning aborts the run; otherwise the warnings
//! are surfaced and the merge proceeds.

use crate::decision::MergeDecision;
use crate::error::{Result, SyncError};

/// Outcome of evaluating a decision set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    HasWarnings(Vec<String>),
}

impl Verdict {
    pub fn is_clean(&self) -> bool {
        matches!(self, Verdict::Clean)
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            Verdict::Clean => &[],
            Verdict::HasWarnings(w) => w,
        }
    }
}

/// Collects every warning-class decision into a verdict.
pub fn evaluate(decisions: &[MergeDecision]) -> Verdict {
    let warnings: Vec<String> = decisions
        .iter()
        .filter(|d| d.is_warning())
        .map(|d| d.describe())
        .collect();
    if warnings.is_empty() {
        Verdict::Clean
    } else {
        Verdict::HasWarnings(warnings)
    }
}

/// Errors out when strict mode is on and the verdict carries warnings.
pub fn enforce_strict(strict: bool, verdict: &Verdict) -> Result<()> {
    match verdict {
        Verdict::HasWarnings(warnings) if strict => Err(SyncError::StrictMode {
            warnings: warnings.clone(),
        }),
        _ => Ok(()),
    }
}
