//! Canonical data model shared by every format adapter.
//!
//! These are the "lingua franca" records that all format-specific adapters
//! convert to and from. Supporting N formats this way needs 2N converters
//! instead of N² pairwise ones.
//!
//! Each record carries a metadata side-table for fields that have no
//! canonical slot. Keys in the side-table are namespaced by originating
//! format (`"<format>_<field>"`) so extensions from different formats never
//! collide on one record.

use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Kinds of configuration that can be reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigKind {
    Agent,
    Permission,
    SlashCommand,
}

impl ConfigKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Permission => "permission",
            Self::SlashCommand => "slash-command",
        }
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds a metadata key namespaced by the originating format.
pub fn metadata_key(format: &str, field: &str) -> String {
    format!("{format}_{field}")
}

/// Open key-value side-table preserving format-specific fields.
pub type Metadata = BTreeMap<String, Value>;

/// Canonical representation of an AI agent definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalAgent {
    /// Agent identifier, used for file matching across formats.
    pub name: String,
    pub description: String,
    /// Full markdown instructions / system prompt.
    pub instructions: String,
    /// Normalized tool names.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Model identifier in canonical shorthand (sonnet, opus, haiku, ...).
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Format this record was originally parsed from.
    #[serde(default)]
    pub source_format: Option<String>,
}

/// Canonical representation of permission rules.
///
/// Three named rule sets; set membership is what matters, not order.
/// Pattern equality is exact string equality; no glob evaluation happens
/// at this layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPermission {
    #[serde(default)]
    pub allow: BTreeSet<String>,
    #[serde(default)]
    pub deny: BTreeSet<String>,
    #[serde(default)]
    pub ask: BTreeSet<String>,
    /// Default behavior when no rule matches (allow, deny, ask).
    #[serde(default)]
    pub default_mode: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub source_format: Option<String>,
}

/// Canonical representation of a reusable slash-command prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalCommand {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Markdown body of the prompt.
    pub body: String,
    #[serde(default)]
    pub argument_hint: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub source_format: Option<String>,
}

macro_rules! metadata_accessors {
    ($ty:ty) => {
        impl $ty {
            /// Stores a format-specific field that has no canonical slot.
            pub fn set_metadata(&mut self, key: impl Into<String>, value: Value) {
                self.metadata.insert(key.into(), value);
            }

            /// Retrieves a format-specific field, if present.
            pub fn get_metadata(&self, key: &str) -> Option<&Value> {
                self.metadata.get(key)
            }

            pub fn has_metadata(&self, key: &str) -> bool {
                self.metadata.contains_key(key)
            }
        }
    };
}

metadata_accessors!(CanonicalAgent);
metadata_accessors!(CanonicalPermission);
metadata_accessors!(CanonicalCommand);

/// A canonical record of any supported kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CanonicalRecord {
    Agent(CanonicalAgent),
    Permission(CanonicalPermission),
    SlashCommand(CanonicalCommand),
}

impl CanonicalRecord {
    pub fn kind(&self) -> ConfigKind {
        match self {
            Self::Agent(_) => ConfigKind::Agent,
            Self::Permission(_) => ConfigKind::Permission,
            Self::SlashCommand(_) => ConfigKind::SlashCommand,
        }
    }

    /// Record identifier; permissions are a single document and have none.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Agent(a) => Some(&a.name),
            Self::Permission(_) => None,
            Self::SlashCommand(c) => Some(&c.name),
        }
    }

    /// An empty record of the given kind, used as the merge target when no
    /// target file exists yet.
    pub fn empty(kind: ConfigKind) -> Self {
        match kind {
            ConfigKind::Agent => Self::Agent(CanonicalAgent::default()),
            ConfigKind::Permission => Self::Permission(CanonicalPermission::default()),
            ConfigKind::SlashCommand => Self::SlashCommand(CanonicalCommand::default()),
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            Self::Agent(a) => &a.metadata,
            Self::Permission(p) => &p.metadata,
            Self::SlashCommand(c) => &c.metadata,
        }
    }

    pub fn source_format(&self) -> Option<&str> {
        match self {
            Self::Agent(a) => a.source_format.as_deref(),
            Self::Permission(p) => p.source_format.as_deref(),
            Self::SlashCommand(c) => c.source_format.as_deref(),
        }
    }

    pub fn set_source_format(&mut self, format: &str) {
        let slot = match self {
            Self::Agent(a) => &mut a.source_format,
            Self::Permission(p) => &mut p.source_format,
            Self::SlashCommand(c) => &mut c.source_format,
        };
        *slot = Some(format.to_string());
    }

    /// Minimal invariant check: agents and slash commands require a name.
    pub fn validate(&self) -> Result<()> {
        let missing_name = match self {
            Self::Agent(a) => a.name.trim().is_empty(),
            Self::SlashCommand(c) => c.name.trim().is_empty(),
            Self::Permission(_) => false,
        };
        if missing_name {
            return Err(SyncError::Validation {
                kind: self.kind(),
                message: "record name must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// The canonical values of both endpoints as of the last committed sync.
///
/// Both sides are kept: deletion propagation needs the old source to detect
/// a removal and the old target to distinguish "target kept the pattern"
/// from "target re-added it after the snapshot".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPair {
    pub source: CanonicalRecord,
    pub target: CanonicalRecord,
}
