//! Canonical data model and merge engine for unisync.
//!
//! Configuration artifacts from different AI coding tools are lifted into
//! canonical records (agents, permission documents, slash-command prompts),
//! merged field by field against the last-synced snapshot, and gated for
//! lossy conversions before anything is written back.
//!
//! Format-specific parsing and rendering lives behind the [`FormatAdapter`]
//! trait; concrete adapters are in the `unisync-adapters` crate.

pub mod boundary;
pub mod canonical;
pub mod decision;
pub mod error;
pub mod fsio;
pub mod gate;
pub mod merge;

pub use boundary::FormatAdapter;
pub use canonical::{
    metadata_key, CanonicalAgent, CanonicalCommand, CanonicalPermission, CanonicalRecord,
    ConfigKind, Metadata, SnapshotPair,
};
pub use decision::{DecisionAction, MergeDecision};
pub use error::{Result, SyncError};
pub use gate::{enforce_strict, evaluate, Verdict};
pub use merge::{merge_records, FieldSupport};
