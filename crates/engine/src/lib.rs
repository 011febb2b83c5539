//! Sync orchestration for unisync.
//!
//! Couples the merge engine to concrete format adapters and the state
//! store: in-place pair sync (optionally bidirectional), one-shot
//! conversion, and directory-tree sync with parallel pairs.

pub mod discovery;
pub mod orchestrator;
pub mod report;

pub use discovery::discover;
pub use orchestrator::{warning_messages, SyncOptions, SyncOrchestrator};
pub use report::{PairReport, RunReport, SkipReason};
