//! Adapter for the codex on-disk layout.
//!
//! Slash commands are bare Markdown prompt files (no frontmatter), so
//! description, argument hint and model survive only in metadata.
//! Permissions live in a TOML document under a `[permissions]` table
//! with `allow` / `deny` / `ask` arrays.

use crate::claude::file_stem;
use crate::value::{json_to_toml, toml_to_json};
use std::collections::BTreeSet;
use std::path::Path;
use toml::Value as Toml;
use unisync_core::{
    metadata_key, CanonicalCommand, CanonicalPermission, CanonicalRecord, ConfigKind,
    FieldSupport, FormatAdapter, Result, SyncError,
};

pub const CODEX: &str = "codex";

#[derive(Debug, Default)]
pub struct CodexAdapter;

fn string_array(table: &toml::map::Map<String, Toml>, key: &str) -> BTreeSet<String> {
    table
        .get(key)
        .and_then(Toml::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Toml::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl CodexAdapter {
    fn parse_permission(&self, content: &str) -> Result<CanonicalPermission> {
        let root: Toml = content
            .parse()
            .map_err(|e| SyncError::parse(format!("invalid permission TOML: {e}")))?;
        let Some(root) = root.as_table() else {
            return Err(SyncError::parse("permission TOML must be a table"));
        };
        let mut permission = CanonicalPermission::default();
        for (key, value) in root {
            if key != "permissions" {
                permission
                    .metadata
                    .insert(metadata_key(CODEX, key), toml_to_json(value));
            }
        }
        if let Some(perms) = root.get("permissions").and_then(Toml::as_table) {
            permission.allow = string_array(perms, "allow");
            permission.deny = string_array(perms, "deny");
            permission.ask = string_array(perms, "ask");
            permission.default_mode = perms
                .get("default_mode")
                .and_then(Toml::as_str)
                .map(str::to_string);
        }
        Ok(permission)
    }

    fn render_permission(&self, permission: &CanonicalPermission) -> Result<String> {
        let mut perms = toml::map::Map::new();
        let to_array = |set: &BTreeSet<String>| {
            Toml::Array(set.iter().map(|p| Toml::String(p.clone())).collect())
        };
        perms.insert("allow".into(), to_array(&permission.allow));
        perms.insert("deny".into(), to_array(&permission.deny));
        perms.insert("ask".into(), to_array(&permission.ask));
        if let Some(mode) = &permission.default_mode {
            perms.insert("default_mode".into(), Toml::String(mode.clone()));
        }

        let mut root = toml::map::Map::new();
        let prefix = format!("{CODEX}_");
        for (key, value) in &permission.metadata {
            if let Some(field) = key.strip_prefix(&prefix) {
                if field != "permissions" {
                    if let Some(value) = json_to_toml(value) {
                        root.insert(field.to_string(), value);
                    }
                }
            }
        }
        root.insert("permissions".into(), Toml::Table(perms));
        toml::to_string_pretty(&Toml::Table(root))
            .map_err(|e| SyncError::parse(format!("failed to render permission TOML: {e}")))
    }

    fn parse_command(&self, content: &str, path: &Path) -> CanonicalCommand {
        CanonicalCommand {
            name: file_stem(path),
            description: None,
            body: content.to_string(),
            argument_hint: None,
            model: None,
            metadata: Default::default(),
            source_format: None,
        }
    }
}

impl FormatAdapter for CodexAdapter {
    fn name(&self) -> &'static str {
        CODEX
    }

    fn file_extension(&self, kind: ConfigKind) -> &'static str {
        match kind {
            ConfigKind::Permission => "toml",
            _ => "md",
        }
    }

    fn supported_kinds(&self) -> &'static [ConfigKind] {
        &[ConfigKind::Permission, ConfigKind::SlashCommand]
    }

    fn field_support(&self, kind: ConfigKind) -> FieldSupport {
        match kind {
            ConfigKind::Permission => FieldSupport {
                allow_rules: true,
                deny_rules: true,
                ask_rules: true,
                default_mode: true,
                ..FieldSupport::default()
            },
            // Prompt files are body-only.
            _ => FieldSupport {
                instructions: true,
                ..FieldSupport::default()
            },
        }
    }

    fn parse(&self, kind: ConfigKind, content: &str, path: &Path) -> Result<CanonicalRecord> {
        let record = match kind {
            ConfigKind::Permission => self
                .parse_permission(content)
                .map(CanonicalRecord::Permission),
            ConfigKind::SlashCommand => Ok(CanonicalRecord::SlashCommand(
                self.parse_command(content, path),
            )),
            ConfigKind::Agent => Err(SyncError::UnsupportedKind {
                format: CODEX.to_string(),
                kind,
            }),
        };
        record.map_err(|e| e.with_path(path))
    }

    fn render(&self, record: &CanonicalRecord) -> Result<String> {
        match record {
            CanonicalRecord::Permission(p) => self.render_permission(p),
            CanonicalRecord::SlashCommand(c) => Ok(c.body.clone()),
            CanonicalRecord::Agent(_) => Err(SyncError::UnsupportedKind {
                format: CODEX.to_string(),
                kind: ConfigKind::Agent,
            }),
        }
    }
}
