//! YAML frontmatter splitting and rendering for Markdown config files.

use regex::Regex;
use serde_yaml::Mapping;
use std::sync::LazyLock;
use unisync_core::{Result, SyncError};

// Opening delimiter on the first line, closing delimiter on its own line.
static FRONTMATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A---\r?\n(.*?)\r?\n---\r?\n?(.*)\z").expect("valid regex")
});

/// A Markdown document split into optional frontmatter and body.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub frontmatter: Option<Mapping>,
    pub body: String,
}

/// Splits `content` into frontmatter mapping and body.
///
/// Content without a leading `---` block is all body. A present but
/// malformed YAML block is a parse error, not silently skipped.
pub fn split(content: &str) -> Result<Document> {
    let Some(captures) = FRONTMATTER.captures(content) else {
        return Ok(Document {
            frontmatter: None,
            body: content.to_string(),
        });
    };
    let yaml = &captures[1];
    let body = captures[2].to_string();
    let frontmatter: Mapping = serde_yaml::from_str(yaml)
        .map_err(|e| SyncError::parse(format!("invalid YAML frontmatter: {e}")))?;
    Ok(Document {
        frontmatter: Some(frontmatter),
        body,
    })
}

/// Renders a frontmatter mapping and body back to file content.
///
/// Key order follows mapping insertion order, so renders are
/// deterministic for a given record.
pub fn render(frontmatter: &Mapping, body: &str) -> Result<String> {
    if frontmatter.is_empty() {
        return Ok(body.to_string());
    }
    let yaml = serde_yaml::to_string(frontmatter)
        .map_err(|e| SyncError::parse(format!("failed to render frontmatter: {e}")))?;
    Ok(format!("---\n{yaml}---\n{body}"))
}
