//! Merge decisions: the per-field record of what the merge engine did.
//!
//! Decisions are ephemeral: produced during a merge, consumed by the
//! conflict gate and surfaced to the user, never persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a single field or rule was resolved during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionAction {
    /// Value identical on both sides (or target-only edit preserved).
    Unchanged,
    /// Source value applied where the target had none.
    Added,
    /// Source value replaced the target's value.
    Updated,
    /// Source capability represented in a weaker target-supported form.
    LossyDowngrade,
    /// Target format cannot represent the field; retained in metadata only.
    Dropped,
}

impl DecisionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Added => "added",
            Self::Updated => "updated",
            Self::LossyDowngrade => "lossy-downgrade",
            Self::Dropped => "dropped",
        }
    }

    /// Lossy downgrades and drops are warnings; everything else is clean.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::LossyDowngrade | Self::Dropped)
    }
}

impl fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One merge decision for a field or permission rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeDecision {
    /// Canonical field name ("description", "allow", ...).
    pub field: String,
    pub action: DecisionAction,
    /// Human-readable reason, shown as a warning for lossy/dropped actions.
    pub note: String,
}

impl MergeDecision {
    pub fn new(field: impl Into<String>, action: DecisionAction, note: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            action,
            note: note.into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.action.is_warning()
    }

    /// One-line description for reports and diagnostics.
    pub fn describe(&self) -> String {
        if self.note.is_empty() {
            format!("{}: {}", self.field, self.action)
        } else {
            format!("{}: {} ({})", self.field, self.action, self.note)
        }
    }
}

impl fmt::Display for MergeDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_classification() {
        assert!(!DecisionAction::Unchanged.is_warning());
        assert!(!DecisionAction::Added.is_warning());
        assert!(!DecisionAction::Updated.is_warning());
        assert!(DecisionAction::LossyDowngrade.is_warning());
        assert!(DecisionAction::Dropped.is_warning());
    }

    #[test]
    fn describe_includes_note_when_present() {
        let d = MergeDecision::new("deny", DecisionAction::LossyDowngrade, "'rm -rf' -> ask");
        assert_eq!(d.describe(), "deny: lossy-downgrade ('rm -rf' -> ask)");
        let bare = MergeDecision::new("model", DecisionAction::Unchanged, "");
        assert_eq!(bare.describe(), "model: unchanged");
    }
}
