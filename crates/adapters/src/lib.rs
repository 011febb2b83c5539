//! Format adapters for unisync.
//!
//! Each adapter lifts one tool's on-disk config layout into canonical
//! records and lowers them back, declaring per-field capabilities so the
//! merge engine knows what the format can hold.

pub mod claude;
pub mod codex;
pub mod copilot;
pub mod frontmatter;
pub mod models;
pub mod registry;
pub mod value;

pub use claude::ClaudeAdapter;
pub use codex::CodexAdapter;
pub use copilot::CopilotAdapter;
pub use registry::FormatRegistry;
