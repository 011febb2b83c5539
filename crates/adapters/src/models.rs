//! Model-name mapping between formats.
//!
//! The canonical model field stores the short alias ("sonnet"). Claude
//! and codex files use the alias directly; copilot agent files carry a
//! fully qualified model id, so the copilot adapter normalizes on parse
//! and expands on render. Unrecognized names pass through untouched.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Short model aliases understood across formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelAlias {
    Opus,
    Sonnet,
    Haiku,
}

impl ModelAlias {
    /// Matches both the alias itself and fully qualified ids.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        if lower.contains("opus") {
            Some(Self::Opus)
        } else if lower.contains("sonnet") {
            Some(Self::Sonnet)
        } else if lower.contains("haiku") {
            Some(Self::Haiku)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opus => "opus",
            Self::Sonnet => "sonnet",
            Self::Haiku => "haiku",
        }
    }
}

/// Alias → fully qualified id used in copilot agent files.
static ALIAS_TO_COPILOT: LazyLock<HashMap<ModelAlias, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (ModelAlias::Opus, "claude-opus-4.1"),
        (ModelAlias::Sonnet, "claude-sonnet-4.5"),
        (ModelAlias::Haiku, "claude-haiku-4.5"),
    ])
});

/// Collapses any recognized model id to its short alias.
pub fn normalize_model(model: &str) -> String {
    ModelAlias::parse(model)
        .map(|alias| alias.as_str().to_string())
        .unwrap_or_else(|| model.to_string())
}

/// Expands a short alias to the copilot model id.
pub fn copilot_model_id(model: &str) -> String {
    ModelAlias::parse(model)
        .and_then(|alias| ALIAS_TO_COPILOT.get(&alias))
        .map(|id| id.to_string())
        .unwrap_or_else(|| model.to_string())
}
