//! Sync-state persistence for unisync.
//!
//! Remembers, per file pair, the content fingerprints and the canonical
//! snapshot of both sides as of the last committed sync. The snapshot is
//! what lets the merge engine tell "target kept a rule" apart from
//! "target re-added it" when propagating deletions.

pub mod store;

pub use store::{fingerprint, now_rfc3339, pair_id, PairEntry, SyncStateStore};
