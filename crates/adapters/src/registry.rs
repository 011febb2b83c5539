//! Lookup of adapters by format name.

use crate::{ClaudeAdapter, CodexAdapter, CopilotAdapter};
use std::collections::BTreeMap;
use unisync_core::FormatAdapter;

/// Holds one adapter instance per registered format.
#[derive(Default)]
pub struct FormatRegistry {
    adapters: BTreeMap<&'static str, Box<dyn FormatAdapter>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the three built-in formats.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ClaudeAdapter));
        registry.register(Box::new(CopilotAdapter));
        registry.register(Box::new(CodexAdapter));
        registry
    }

    pub fn register(&mut self, adapter: Box<dyn FormatAdapter>) {
        self.adapters.insert(adapter.name(), adapter);
    }

    pub fn get(&self, name: &str) -> Option<&dyn FormatAdapter> {
        self.adapters.get(name).map(Box::as_ref)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.adapters.keys().copied()
    }
}
