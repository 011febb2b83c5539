//! Per-field merge of canonical records.
//!
//! Given the last-synced snapshot (if any), a new source value and the
//! current target value, the engine produces a merged target value plus
//! one [`MergeDecision`] per field or rule. Change detection is always
//! snapshot-relative: a target-only edit made between syncs is preserved
//! rather than clobbered.
//!
//! Tie-break when both sides changed the same field since the snapshot:
//! the side designated source for this invocation wins, tagged `updated`
//! with an explicit overwrite note. This is a documented last-writer-wins
//! policy, not silent loss.

use crate::canonical::{
    metadata_key, CanonicalAgent, CanonicalCommand, CanonicalPermission, CanonicalRecord,
    Metadata, SnapshotPair,
};
use crate::decision::{DecisionAction, MergeDecision};
use crate::error::{Result, SyncError};
use serde_json::{json, Value};
use std::collections::BTreeSet;

/// Which canonical fields a format can represent.
///
/// Declared statically per format and kind; consulted to decide between
/// full fidelity, `lossy-downgrade` and `dropped`.
#[derive(Debug, Clone, Default)]
pub struct FieldSupport {
    pub description: bool,
    pub instructions: bool,
    pub tools: bool,
    pub model: bool,
    pub argument_hint: bool,
    pub allow_rules: bool,
    pub deny_rules: bool,
    pub ask_rules: bool,
    pub default_mode: bool,
}

impl FieldSupport {
    /// Every canonical field representable.
    pub fn full() -> Self {
        Self {
            description: true,
            instructions: true,
            tools: true,
            model: true,
            argument_hint: true,
            allow_rules: true,
            deny_rules: true,
            ask_rules: true,
            default_mode: true,
        }
    }
}

/// Merges a source record into a target record of the same kind.
///
/// `target` is `None` when the target file does not exist yet (first sync
/// of a pair, or single-file convert); the merge then runs against an
/// empty record. A snapshot whose kind does not match is ignored.
pub fn merge_records(
    old: Option<&SnapshotPair>,
    source: &CanonicalRecord,
    target: Option<&CanonicalRecord>,
    target_format: &str,
    support: &FieldSupport,
) -> Result<(CanonicalRecord, Vec<MergeDecision>)> {
    let empty;
    let target = match target {
        Some(t) => t,
        None => {
            empty = CanonicalRecord::empty(source.kind());
            &empty
        }
    };
    if target.kind() != source.kind() {
        return Err(SyncError::Validation {
            kind: source.kind(),
            message: format!(
                "cannot merge {} record into {} record",
                source.kind(),
                target.kind()
            ),
        });
    }
    let old = old.filter(|s| s.source.kind() == source.kind() && s.target.kind() == source.kind());

    match (source, target) {
        (CanonicalRecord::Agent(s), CanonicalRecord::Agent(t)) => {
            let old = old.and_then(|p| match (&p.source, &p.target) {
                (CanonicalRecord::Agent(os), CanonicalRecord::Agent(ot)) => Some((os, ot)),
                _ => None,
            });
            let (merged, decisions) = merge_agents(old, s, t, target_format, support);
            Ok((CanonicalRecord::Agent(merged), decisions))
        }
        (CanonicalRecord::Permission(s), CanonicalRecord::Permission(t)) => {
            let old = old.and_then(|p| match (&p.source, &p.target) {
                (CanonicalRecord::Permission(os), CanonicalRecord::Permission(ot)) => {
                    Some((os, ot))
                }
                _ => None,
            });
            let (merged, decisions) = merge_permissions(old, s, t, target_format, support);
            Ok((CanonicalRecord::Permission(merged), decisions))
        }
        (CanonicalRecord::SlashCommand(s), CanonicalRecord::SlashCommand(t)) => {
            let old = old.and_then(|p| match (&p.source, &p.target) {
                (CanonicalRecord::SlashCommand(os), CanonicalRecord::SlashCommand(ot)) => {
                    Some((os, ot))
                }
                _ => None,
            });
            let (merged, decisions) = merge_commands(old, s, t, target_format, support);
            Ok((CanonicalRecord::SlashCommand(merged), decisions))
        }
        // Kind equality was checked above.
        _ => unreachable!("record kinds were checked for equality"),
    }
}

/// Values that can be dropped into the metadata side-table.
trait FieldValue: Clone + PartialEq {
    fn is_empty_value(&self) -> bool;
    fn to_json(&self) -> Value;
}

impl FieldValue for String {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
    fn to_json(&self) -> Value {
        json!(self)
    }
}

impl FieldValue for Option<String> {
    fn is_empty_value(&self) -> bool {
        self.is_none()
    }
    fn to_json(&self) -> Value {
        self.as_deref().map(|s| json!(s)).unwrap_or(Value::Null)
    }
}

impl FieldValue for Vec<String> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
    fn to_json(&self) -> Value {
        json!(self)
    }
}

/// Snapshot-relative three-way resolution of one content field.
fn resolve_field<T: FieldValue>(
    field: &str,
    old: Option<(&T, &T)>,
    source: &T,
    target: &T,
    decisions: &mut Vec<MergeDecision>,
) -> T {
    use DecisionAction::*;

    let Some((old_source, old_target)) = old else {
        // First sync of the pair: populated source fields are treated as
        // added; an empty source field never deletes target data.
        return if source == target {
            decisions.push(MergeDecision::new(field, Unchanged, ""));
            target.clone()
        } else if target.is_empty_value() {
            decisions.push(MergeDecision::new(field, Added, "no prior sync; source value applied"));
            source.clone()
        } else if source.is_empty_value() {
            // An absent source field is not an addition; it must not
            // delete data unique to the target.
            decisions.push(MergeDecision::new(
                field,
                Unchanged,
                "no prior sync; empty source left target value in place",
            ));
            target.clone()
        } else {
            decisions.push(MergeDecision::new(
                field,
                Updated,
                "no prior sync; source value overwrote target",
            ));
            source.clone()
        };
    };

    let source_changed = source != old_source;
    let target_changed = target != old_target;
    match (source_changed, target_changed) {
        (false, false) => {
            decisions.push(MergeDecision::new(field, Unchanged, ""));
            target.clone()
        }
        (true, false) => {
            let action = if target.is_empty_value() { Added } else { Updated };
            decisions.push(MergeDecision::new(field, action, "source changed since last sync"));
            source.clone()
        }
        (false, true) => {
            decisions.push(MergeDecision::new(field, Unchanged, "target edit preserved"));
            target.clone()
        }
        (true, true) => {
            if source == target {
                decisions.push(MergeDecision::new(field, Unchanged, "both sides converged"));
                target.clone()
            } else {
                decisions.push(MergeDecision::new(
                    field,
                    Updated,
                    "conflict: both sides changed since last sync; source value overwrote target",
                ));
                source.clone()
            }
        }
    }
}

/// Resolves one field, routing unsupported fields into metadata.
#[allow(clippy::too_many_arguments)]
fn merge_scalar<T: FieldValue>(
    field: &str,
    supported: bool,
    source_format: &str,
    old: Option<(&T, &T)>,
    source: &T,
    target: &T,
    metadata: &mut Metadata,
    decisions: &mut Vec<MergeDecision>,
) -> T {
    if !supported {
        if !source.is_empty_value() {
            metadata.insert(metadata_key(source_format, field), source.to_json());
            // A drop is only news once: re-syncing a source value that has
            // not changed since the last sync stays warning-free.
            if old.is_some_and(|(old_source, _)| old_source == source) {
                decisions.push(MergeDecision::new(
                    field,
                    DecisionAction::Unchanged,
                    "already retained in metadata",
                ));
            } else {
                decisions.push(MergeDecision::new(
                    field,
                    DecisionAction::Dropped,
                    format!("target format cannot represent '{field}'; retained in metadata"),
                ));
            }
        }
        return target.clone();
    }
    resolve_field(field, old, source, target, decisions)
}

/// Union with deletion propagation for one permission category.
///
/// A pattern is removed only when the old source snapshot had it, the new
/// source dropped it, and the target held it since the snapshot (a target
/// re-add after the snapshot survives).
fn merge_rule_set(
    category: &'static str,
    old: Option<(&BTreeSet<String>, &BTreeSet<String>)>,
    source: &BTreeSet<String>,
    target: &BTreeSet<String>,
    emit: bool,
    decisions: &mut Vec<MergeDecision>,
) -> BTreeSet<String> {
    let mut merged: BTreeSet<String> = source.union(target).cloned().collect();

    if let Some((old_source, old_target)) = old {
        for pattern in old_source {
            let deleted_on_source = !source.contains(pattern);
            let target_kept_it = target.contains(pattern) && old_target.contains(pattern);
            if deleted_on_source && target_kept_it {
                merged.remove(pattern);
                if emit {
                    decisions.push(MergeDecision::new(
                        category,
                        DecisionAction::Updated,
                        format!("'{pattern}' removed: deleted on source since last sync"),
                    ));
                }
            }
        }
    }

    if emit {
        for pattern in &merged {
            if source.contains(pattern) && !target.contains(pattern) {
                decisions.push(MergeDecision::new(
                    category,
                    DecisionAction::Added,
                    format!("'{pattern}' added from source"),
                ));
            }
        }
    }

    merged
}

/// Metadata pass-through: keys owned by the target format come from the
/// target side; every other key is preserved verbatim from the source.
fn merge_metadata(source: &Metadata, target: &Metadata, target_format: &str) -> Metadata {
    let own_prefix = format!("{target_format}_");
    let mut merged = source.clone();
    for (key, value) in target {
        if key.starts_with(&own_prefix) {
            merged.insert(key.clone(), value.clone());
        } else {
            merged.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
    merged
}

pub fn merge_agents(
    old: Option<(&CanonicalAgent, &CanonicalAgent)>,
    source: &CanonicalAgent,
    target: &CanonicalAgent,
    target_format: &str,
    support: &FieldSupport,
) -> (CanonicalAgent, Vec<MergeDecision>) {
    let mut decisions = Vec::new();
    let mut metadata = merge_metadata(&source.metadata, &target.metadata, target_format);
    let src_fmt = source.source_format.as_deref().unwrap_or("source").to_string();

    let name = if target.name.is_empty() {
        source.name.clone()
    } else {
        target.name.clone()
    };
    let description = merge_scalar(
        "description",
        support.description,
        &src_fmt,
        old.map(|(s, t)| (&s.description, &t.description)),
        &source.description,
        &target.description,
        &mut metadata,
        &mut decisions,
    );
    let instructions = merge_scalar(
        "instructions",
        support.instructions,
        &src_fmt,
        old.map(|(s, t)| (&s.instructions, &t.instructions)),
        &source.instructions,
        &target.instructions,
        &mut metadata,
        &mut decisions,
    );
    let tools = merge_scalar(
        "tools",
        support.tools,
        &src_fmt,
        old.map(|(s, t)| (&s.tools, &t.tools)),
        &source.tools,
        &target.tools,
        &mut metadata,
        &mut decisions,
    );
    let model = merge_scalar(
        "model",
        support.model,
        &src_fmt,
        old.map(|(s, t)| (&s.model, &t.model)),
        &source.model,
        &target.model,
        &mut metadata,
        &mut decisions,
    );

    let merged = CanonicalAgent {
        name,
        description,
        instructions,
        tools,
        model,
        metadata,
        source_format: Some(target_format.to_string()),
    };
    (merged, decisions)
}

pub fn merge_commands(
    old: Option<(&CanonicalCommand, &CanonicalCommand)>,
    source: &CanonicalCommand,
    target: &CanonicalCommand,
    target_format: &str,
    support: &FieldSupport,
) -> (CanonicalCommand, Vec<MergeDecision>) {
    let mut decisions = Vec::new();
    let mut metadata = merge_metadata(&source.metadata, &target.metadata, target_format);
    let src_fmt = source.source_format.as_deref().unwrap_or("source").to_string();

    let name = if target.name.is_empty() {
        source.name.clone()
    } else {
        target.name.clone()
    };
    let description = merge_scalar(
        "description",
        support.description,
        &src_fmt,
        old.map(|(s, t)| (&s.description, &t.description)),
        &source.description,
        &target.description,
        &mut metadata,
        &mut decisions,
    );
    // The body is the prompt itself; every format that has the kind has it.
    let body = merge_scalar(
        "body",
        support.instructions,
        &src_fmt,
        old.map(|(s, t)| (&s.body, &t.body)),
        &source.body,
        &target.body,
        &mut metadata,
        &mut decisions,
    );
    let argument_hint = merge_scalar(
        "argument_hint",
        support.argument_hint,
        &src_fmt,
        old.map(|(s, t)| (&s.argument_hint, &t.argument_hint)),
        &source.argument_hint,
        &target.argument_hint,
        &mut metadata,
        &mut decisions,
    );
    let model = merge_scalar(
        "model",
        support.model,
        &src_fmt,
        old.map(|(s, t)| (&s.model, &t.model)),
        &source.model,
        &target.model,
        &mut metadata,
        &mut decisions,
    );

    let merged = CanonicalCommand {
        name,
        description,
        body,
        argument_hint,
        model,
        metadata,
        source_format: Some(target_format.to_string()),
    };
    (merged, decisions)
}

pub fn merge_permissions(
    old: Option<(&CanonicalPermission, &CanonicalPermission)>,
    source: &CanonicalPermission,
    target: &CanonicalPermission,
    target_format: &str,
    support: &FieldSupport,
) -> (CanonicalPermission, Vec<MergeDecision>) {
    let mut decisions = Vec::new();
    let mut metadata = merge_metadata(&source.metadata, &target.metadata, target_format);
    let src_fmt = source.source_format.as_deref().unwrap_or("source").to_string();

    // Union + deletion propagation per category. Decisions are only emitted
    // for categories the target supports; unsupported ones get their own
    // downgrade/drop decisions below.
    let allow = merge_rule_set(
        "allow",
        old.map(|(s, t)| (&s.allow, &t.allow)),
        &source.allow,
        &target.allow,
        support.allow_rules,
        &mut decisions,
    );
    let deny = merge_rule_set(
        "deny",
        old.map(|(s, t)| (&s.deny, &t.deny)),
        &source.deny,
        &target.deny,
        support.deny_rules,
        &mut decisions,
    );
    let ask = merge_rule_set(
        "ask",
        old.map(|(s, t)| (&s.ask, &t.ask)),
        &source.ask,
        &target.ask,
        support.ask_rules,
        &mut decisions,
    );

    let mut out = CanonicalPermission {
        source_format: Some(target_format.to_string()),
        ..Default::default()
    };
    if support.allow_rules {
        out.allow = allow.clone();
    }
    if support.deny_rules {
        out.deny = deny.clone();
    }
    if support.ask_rules {
        out.ask = ask.clone();
    }

    // Downgrade unsupported categories to the nearest supported one; a
    // pattern is never silently dropped.
    if !support.allow_rules {
        downgrade_rules(
            "allow", allow, support.ask_rules, "ask", &target.ask, &mut out.ask,
            target_format, &src_fmt, &mut metadata, &mut decisions,
        );
    }
    if !support.deny_rules {
        downgrade_rules(
            "deny", deny, support.ask_rules, "ask", &target.ask, &mut out.ask,
            target_format, &src_fmt, &mut metadata, &mut decisions,
        );
    }
    if !support.ask_rules {
        downgrade_rules(
            "ask", ask, support.deny_rules, "deny", &target.deny, &mut out.deny,
            target_format, &src_fmt, &mut metadata, &mut decisions,
        );
    }

    out.default_mode = merge_scalar(
        "default_mode",
        support.default_mode,
        &src_fmt,
        old.map(|(s, t)| (&s.default_mode, &t.default_mode)),
        &source.default_mode,
        &target.default_mode,
        &mut metadata,
        &mut decisions,
    );
    out.metadata = metadata;

    (out, decisions)
}

/// Routes an unsupported category into a fallback set or into metadata.
#[allow(clippy::too_many_arguments)]
fn downgrade_rules(
    category: &'static str,
    patterns: BTreeSet<String>,
    fallback_supported: bool,
    fallback: &'static str,
    target_fallback: &BTreeSet<String>,
    out_fallback: &mut BTreeSet<String>,
    target_format: &str,
    source_format: &str,
    metadata: &mut Metadata,
    decisions: &mut Vec<MergeDecision>,
) {
    if patterns.is_empty() {
        return;
    }
    if fallback_supported {
        for pattern in patterns {
            // A pattern already present in the weaker form loses nothing new;
            // repeated syncs stay warning-free.
            if target_fallback.contains(&pattern) {
                decisions.push(MergeDecision::new(
                    category,
                    DecisionAction::Unchanged,
                    format!("'{pattern}' already represented as {fallback} on target"),
                ));
            } else {
                decisions.push(MergeDecision::new(
                    category,
                    DecisionAction::LossyDowngrade,
                    format!(
                        "'{pattern}': {category} not supported by {target_format}; downgraded to {fallback}"
                    ),
                ));
            }
            out_fallback.insert(pattern);
        }
    } else {
        decisions.push(MergeDecision::new(
            category,
            DecisionAction::Dropped,
            format!(
                "{target_format} supports neither {category} nor {fallback}; {} rule(s) retained in metadata",
                patterns.len()
            ),
        ));
        metadata.insert(metadata_key(source_format, category), json!(patterns));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::ConfigKind;
    use proptest::prelude::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn perm(allow: &[&str], deny: &[&str], ask: &[&str]) -> CanonicalPermission {
        CanonicalPermission {
            allow: set(allow),
            deny: set(deny),
            ask: set(ask),
            ..Default::default()
        }
    }

    fn warnings(decisions: &[MergeDecision]) -> Vec<&MergeDecision> {
        decisions.iter().filter(|d| d.is_warning()).collect()
    }

    #[test]
    fn permission_union_with_empty_snapshot() {
        let source = perm(&["git status", "cargo build"], &[], &[]);
        let target = perm(&["ls"], &[], &[]);
        let (merged, decisions) =
            merge_permissions(None, &source, &target, "claude", &FieldSupport::full());
        assert_eq!(merged.allow, set(&["cargo build", "git status", "ls"]));
        assert!(warnings(&decisions).is_empty());
    }

    #[test]
    fn deletion_propagates_when_target_kept_the_pattern() {
        let old_source = perm(&["git status", "git push"], &[], &[]);
        let old_target = perm(&["git push", "ls"], &[], &[]);
        // Source dropped "git push"; target still carries it from the last sync.
        let source = perm(&["git status"], &[], &[]);
        let target = perm(&["git push", "ls"], &[], &[]);
        let (merged, decisions) = merge_permissions(
            Some((&old_source, &old_target)),
            &source,
            &target,
            "claude",
            &FieldSupport::full(),
        );
        assert!(!merged.allow.contains("git push"));
        assert!(merged.allow.contains("ls"));
        assert!(decisions
            .iter()
            .any(|d| d.action == DecisionAction::Updated && d.note.contains("git push")));
    }

    #[test]
    fn deletion_spares_pattern_readded_by_target() {
        let old_source = perm(&["git push"], &[], &[]);
        // Target did not have the pattern at the last sync...
        let old_target = perm(&[], &[], &[]);
        let source = perm(&[], &[], &[]);
        // ...and added it independently afterwards.
        let target = perm(&["git push"], &[], &[]);
        let (merged, _) = merge_permissions(
            Some((&old_source, &old_target)),
            &source,
            &target,
            "claude",
            &FieldSupport::full(),
        );
        assert!(merged.allow.contains("git push"));
    }

    #[test]
    fn no_deletion_propagation_without_snapshot() {
        let source = perm(&[], &[], &[]);
        let target = perm(&["git push"], &[], &[]);
        let (merged, _) =
            merge_permissions(None, &source, &target, "claude", &FieldSupport::full());
        assert!(merged.allow.contains("git push"));
    }

    #[test]
    fn deny_downgrades_to_ask_when_unsupported() {
        let source = perm(&["git status"], &["rm -rf"], &[]);
        let target = perm(&["bash"], &[], &[]);
        let support = FieldSupport {
            deny_rules: false,
            ..FieldSupport::full()
        };
        let (merged, decisions) = merge_permissions(None, &source, &target, "copilot", &support);
        assert_eq!(merged.allow, set(&["bash", "git status"]));
        assert_eq!(merged.ask, set(&["rm -rf"]));
        assert!(merged.deny.is_empty());
        let warns = warnings(&decisions);
        assert_eq!(warns.len(), 1);
        assert_eq!(warns[0].action, DecisionAction::LossyDowngrade);
        assert!(warns[0].note.contains("rm -rf"));
    }

    #[test]
    fn repeated_downgrade_is_warning_free() {
        // After a first sync the target already carries the rule as ask;
        // re-syncing the same deny rule must not warn again.
        let source = perm(&[], &["rm -rf"], &[]);
        let target = perm(&[], &[], &["rm -rf"]);
        let support = FieldSupport {
            deny_rules: false,
            ..FieldSupport::full()
        };
        let (merged, decisions) = merge_permissions(None, &source, &target, "copilot", &support);
        assert_eq!(merged.ask, set(&["rm -rf"]));
        assert!(warnings(&decisions).is_empty());
    }

    #[test]
    fn rules_without_any_fallback_land_in_metadata() {
        let source = CanonicalPermission {
            ask: set(&["git push"]),
            source_format: Some("claude".to_string()),
            ..Default::default()
        };
        let target = CanonicalPermission::default();
        let support = FieldSupport {
            ask_rules: false,
            deny_rules: false,
            ..FieldSupport::full()
        };
        let (merged, decisions) = merge_permissions(None, &source, &target, "other", &support);
        assert!(merged.ask.is_empty());
        assert_eq!(merged.get_metadata("claude_ask"), Some(&json!(["git push"])));
        assert!(decisions
            .iter()
            .any(|d| d.action == DecisionAction::Dropped && d.field == "ask"));
    }

    #[test]
    fn agent_target_only_edit_is_preserved() {
        let old = CanonicalAgent {
            name: "planner".into(),
            description: "plans".into(),
            instructions: "Plan things.".into(),
            ..Default::default()
        };
        let source = old.clone();
        let mut target = old.clone();
        target.instructions = "Plan things carefully.".into();
        let (merged, decisions) = merge_agents(
            Some((&old, &old)),
            &source,
            &target,
            "copilot",
            &FieldSupport::full(),
        );
        assert_eq!(merged.instructions, "Plan things carefully.");
        assert!(decisions
            .iter()
            .any(|d| d.field == "instructions" && d.note.contains("target edit preserved")));
    }

    #[test]
    fn agent_source_change_replaces_field_wholesale() {
        let old = CanonicalAgent {
            name: "planner".into(),
            instructions: "v1".into(),
            ..Default::default()
        };
        let mut source = old.clone();
        source.instructions = "v2".into();
        let target = old.clone();
        let (merged, decisions) = merge_agents(
            Some((&old, &old)),
            &source,
            &target,
            "copilot",
            &FieldSupport::full(),
        );
        assert_eq!(merged.instructions, "v2");
        assert!(decisions
            .iter()
            .any(|d| d.field == "instructions" && d.action == DecisionAction::Updated));
    }

    #[test]
    fn conflicting_edits_resolve_source_wins_with_note() {
        let old = CanonicalAgent {
            name: "planner".into(),
            instructions: "v1".into(),
            ..Default::default()
        };
        let mut source = old.clone();
        source.instructions = "source v2".into();
        let mut target = old.clone();
        target.instructions = "target v2".into();
        let (merged, decisions) = merge_agents(
            Some((&old, &old)),
            &source,
            &target,
            "claude",
            &FieldSupport::full(),
        );
        assert_eq!(merged.instructions, "source v2");
        let d = decisions
            .iter()
            .find(|d| d.field == "instructions")
            .unwrap();
        assert_eq!(d.action, DecisionAction::Updated);
        assert!(d.note.contains("overwrote"));
    }

    #[test]
    fn unsupported_agent_field_is_dropped_to_metadata() {
        let source = CanonicalAgent {
            name: "planner".into(),
            tools: vec!["read".into(), "edit".into()],
            source_format: Some("claude".to_string()),
            ..Default::default()
        };
        let target = CanonicalAgent {
            name: "planner".into(),
            ..Default::default()
        };
        let support = FieldSupport {
            tools: false,
            ..FieldSupport::full()
        };
        let (merged, decisions) = merge_agents(None, &source, &target, "windsurf", &support);
        assert!(merged.tools.is_empty());
        assert_eq!(merged.get_metadata("claude_tools"), Some(&json!(["read", "edit"])));
        assert!(decisions
            .iter()
            .any(|d| d.field == "tools" && d.action == DecisionAction::Dropped));
    }

    #[test]
    fn foreign_metadata_passes_through_unscathed() {
        let mut source = CanonicalAgent {
            name: "planner".into(),
            ..Default::default()
        };
        source.set_metadata("copilot_handoffs", json!([{"label": "next"}]));
        source.set_metadata("claude_permission_mode", json!("plan"));
        let mut target = CanonicalAgent {
            name: "planner".into(),
            ..Default::default()
        };
        // The claude side owns claude_* keys; its value wins for those.
        target.set_metadata("claude_permission_mode", json!("default"));
        let (merged, _) = merge_agents(None, &source, &target, "claude", &FieldSupport::full());
        assert_eq!(merged.get_metadata("copilot_handoffs"), Some(&json!([{"label": "next"}])));
        assert_eq!(merged.get_metadata("claude_permission_mode"), Some(&json!("default")));
    }

    #[test]
    fn second_merge_over_merged_state_is_quiet() {
        let source = CanonicalAgent {
            name: "planner".into(),
            description: "plans".into(),
            instructions: "Plan.".into(),
            model: Some("sonnet".into()),
            ..Default::default()
        };
        let target = CanonicalAgent {
            name: "planner".into(),
            ..Default::default()
        };
        let (merged, _) = merge_agents(None, &source, &target, "copilot", &FieldSupport::full());
        // Re-run with the committed snapshot and the merged target.
        let (again, decisions) = merge_agents(
            Some((&source, &merged)),
            &source,
            &merged,
            "copilot",
            &FieldSupport::full(),
        );
        assert_eq!(again, merged);
        assert!(decisions
            .iter()
            .all(|d| d.action == DecisionAction::Unchanged));
    }

    #[test]
    fn command_argument_hint_dropped_when_unsupported() {
        let source = CanonicalCommand {
            name: "review".into(),
            body: "Review the diff.".into(),
            argument_hint: Some("<file>".into()),
            source_format: Some("claude".to_string()),
            ..Default::default()
        };
        let target = CanonicalCommand {
            name: "review".into(),
            body: String::new(),
            ..Default::default()
        };
        let support = FieldSupport {
            argument_hint: false,
            description: false,
            model: false,
            ..FieldSupport::full()
        };
        let (merged, decisions) = merge_commands(None, &source, &target, "codex", &support);
        assert_eq!(merged.body, "Review the diff.");
        assert!(merged.argument_hint.is_none());
        assert_eq!(merged.get_metadata("claude_argument_hint"), Some(&json!("<file>")));
        assert!(decisions
            .iter()
            .any(|d| d.field == "argument_hint" && d.action == DecisionAction::Dropped));
    }

    #[test]
    fn repeated_drop_of_unchanged_field_is_quiet() {
        let source = CanonicalCommand {
            name: "review".into(),
            body: "Review the diff.".into(),
            description: Some("Reviews a diff".into()),
            source_format: Some("claude".to_string()),
            ..Default::default()
        };
        let target = CanonicalCommand {
            name: "review".into(),
            ..Default::default()
        };
        let support = FieldSupport {
            description: false,
            argument_hint: false,
            model: false,
            ..FieldSupport::full()
        };
        let (merged, first) = merge_commands(None, &source, &target, "codex", &support);
        assert!(first
            .iter()
            .any(|d| d.field == "description" && d.action == DecisionAction::Dropped));
        // Re-run with the committed snapshot and an unchanged source: the
        // drop was already reported and must not warn again.
        let (again, second) = merge_commands(
            Some((&source, &merged)),
            &source,
            &merged,
            "codex",
            &support,
        );
        assert_eq!(again.body, merged.body);
        assert!(warnings(&second).is_empty());
    }

    #[test]
    fn changed_unsupported_field_is_reported_again() {
        let old = CanonicalCommand {
            name: "review".into(),
            body: "Review.".into(),
            description: Some("v1".into()),
            ..Default::default()
        };
        let mut source = old.clone();
        source.description = Some("v2".into());
        let target = CanonicalCommand {
            name: "review".into(),
            body: "Review.".into(),
            ..Default::default()
        };
        let support = FieldSupport {
            description: false,
            ..FieldSupport::full()
        };
        let (_, decisions) =
            merge_commands(Some((&old, &target)), &source, &target, "codex", &support);
        assert!(decisions
            .iter()
            .any(|d| d.field == "description" && d.action == DecisionAction::Dropped));
    }

    #[test]
    fn first_sync_empty_source_field_keeps_target_value() {
        let source = CanonicalAgent {
            name: "planner".into(),
            instructions: "Plan.".into(),
            ..Default::default()
        };
        let target = CanonicalAgent {
            name: "planner".into(),
            instructions: "Plan.".into(),
            description: "carefully curated local description".into(),
            ..Default::default()
        };
        let (merged, decisions) =
            merge_agents(None, &source, &target, "claude", &FieldSupport::full());
        assert_eq!(merged.description, "carefully curated local description");
        assert!(decisions
            .iter()
            .all(|d| d.field != "description" || d.action == DecisionAction::Unchanged));
    }

    #[test]
    fn merge_records_rejects_kind_mismatch() {
        let source = CanonicalRecord::Agent(CanonicalAgent {
            name: "a".into(),
            ..Default::default()
        });
        let target = CanonicalRecord::Permission(CanonicalPermission::default());
        let err = merge_records(None, &source, Some(&target), "claude", &FieldSupport::full())
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::SyncError::Validation {
                kind: ConfigKind::Agent,
                ..
            }
        ));
    }

    #[test]
    fn merge_records_against_missing_target() {
        let source = CanonicalRecord::SlashCommand(CanonicalCommand {
            name: "review".into(),
            body: "Review.".into(),
            ..Default::default()
        });
        let (merged, decisions) =
            merge_records(None, &source, None, "codex", &FieldSupport::full()).unwrap();
        match merged {
            CanonicalRecord::SlashCommand(c) => assert_eq!(c.body, "Review."),
            other => panic!("unexpected kind: {:?}", other.kind()),
        }
        assert!(decisions.iter().any(|d| d.action == DecisionAction::Added));
    }

    proptest! {
        /// Union law: with an empty prior snapshot the merged allow-set is
        /// exactly A ∪ B.
        #[test]
        fn allow_union_law(
            a in prop::collection::btree_set("[a-z ]{1,12}", 0..8),
            b in prop::collection::btree_set("[a-z ]{1,12}", 0..8),
        ) {
            let source = CanonicalPermission { allow: a.clone(), ..Default::default() };
            let target = CanonicalPermission { allow: b.clone(), ..Default::default() };
            let (merged, _) =
                merge_permissions(None, &source, &target, "claude", &FieldSupport::full());
            let expected: BTreeSet<String> = a.union(&b).cloned().collect();
            prop_assert_eq!(merged.allow, expected);
        }

        /// Re-merging the merged value with its own snapshot changes nothing.
        #[test]
        fn permission_merge_is_idempotent(
            a in prop::collection::btree_set("[a-z ]{1,12}", 0..6),
            b in prop::collection::btree_set("[a-z ]{1,12}", 0..6),
        ) {
            let source = CanonicalPermission { allow: a, ..Default::default() };
            let target = CanonicalPermission { allow: b, ..Default::default() };
            let (merged, _) =
                merge_permissions(None, &source, &target, "claude", &FieldSupport::full());
            let (again, decisions) = merge_permissions(
                Some((&source, &merged)),
                &source,
                &merged,
                "claude",
                &FieldSupport::full(),
            );
            prop_assert_eq!(again.allow, merged.allow);
            prop_assert!(decisions.iter().all(|d| !d.is_warning()));
        }
    }
}
