//! Adapter for the claude on-disk layout.
//!
//! Agents and slash commands are Markdown files with YAML frontmatter;
//! the permission document is the `permissions` object of a
//! `settings.json`. Every canonical field is representable, so this
//! format never loses data on the way in.

use crate::frontmatter::{self, Document};
use crate::models::normalize_model;
use crate::value::{json_to_yaml, yaml_to_json};
use serde_json::{json, Map, Value as Json};
use serde_yaml::{Mapping, Value as Yaml};
use std::collections::BTreeSet;
use std::path::Path;
use unisync_core::{
    metadata_key, CanonicalAgent, CanonicalCommand, CanonicalPermission, CanonicalRecord,
    ConfigKind, FieldSupport, FormatAdapter, Metadata, Result, SyncError,
};

pub const CLAUDE: &str = "claude";

#[derive(Debug, Default)]
pub struct ClaudeAdapter;

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Accepts both the comma-separated string convention and a YAML list.
pub(crate) fn parse_tools(value: &Yaml) -> Vec<String> {
    match value {
        Yaml::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        Yaml::Sequence(seq) => seq
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn yaml_str(fm: &Mapping, key: &str) -> Option<String> {
    fm.get(Yaml::from(key))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// Frontmatter keys this adapter maps onto structural fields; anything
/// else lands in the metadata side-table.
fn stash_extra_keys(fm: &Mapping, structural: &[&str], format: &str, metadata: &mut Metadata) {
    for (key, value) in fm {
        let Some(key) = key.as_str() else { continue };
        if structural.contains(&key) {
            continue;
        }
        metadata.insert(metadata_key(format, key), yaml_to_json(value));
    }
}

/// Restores a format's own metadata keys as frontmatter, skipping any
/// that would shadow a structural field.
fn restore_extra_keys(metadata: &Metadata, structural: &[&str], format: &str, fm: &mut Mapping) {
    let prefix = format!("{format}_");
    for (key, value) in metadata {
        let Some(field) = key.strip_prefix(&prefix) else { continue };
        if structural.contains(&field) {
            continue;
        }
        fm.insert(Yaml::from(field), json_to_yaml(value));
    }
}

fn string_set(value: Option<&Json>) -> BTreeSet<String> {
    value
        .and_then(Json::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Json::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

const AGENT_KEYS: &[&str] = &["name", "description", "tools", "model"];
const COMMAND_KEYS: &[&str] = &["description", "argument-hint", "model"];

impl ClaudeAdapter {
    fn parse_agent(&self, content: &str, path: &Path) -> Result<CanonicalAgent> {
        let Document { frontmatter, body } = frontmatter::split(content)?;
        let fm = frontmatter.unwrap_or_default();
        let mut metadata = Metadata::new();
        stash_extra_keys(&fm, AGENT_KEYS, CLAUDE, &mut metadata);
        Ok(CanonicalAgent {
            name: yaml_str(&fm, "name").unwrap_or_else(|| file_stem(path)),
            description: yaml_str(&fm, "description").unwrap_or_default(),
            instructions: body,
            tools: fm
                .get(Yaml::from("tools"))
                .map(parse_tools)
                .unwrap_or_default(),
            model: yaml_str(&fm, "model").map(|m| normalize_model(&m)),
            metadata,
            source_format: None,
        })
    }

    fn parse_command(&self, content: &str, path: &Path) -> Result<CanonicalCommand> {
        let Document { frontmatter, body } = frontmatter::split(content)?;
        let fm = frontmatter.unwrap_or_default();
        let mut metadata = Metadata::new();
        stash_extra_keys(&fm, COMMAND_KEYS, CLAUDE, &mut metadata);
        Ok(CanonicalCommand {
            name: file_stem(path),
            description: yaml_str(&fm, "description"),
            body,
            argument_hint: yaml_str(&fm, "argument-hint"),
            model: yaml_str(&fm, "model").map(|m| normalize_model(&m)),
            metadata,
            source_format: None,
        })
    }

    fn parse_permission(&self, content: &str) -> Result<CanonicalPermission> {
        let root: Json = serde_json::from_str(content)
            .map_err(|e| SyncError::parse(format!("invalid settings JSON: {e}")))?;
        let Json::Object(root) = root else {
            return Err(SyncError::parse("settings JSON must be an object"));
        };
        let mut metadata = Metadata::new();
        let mut permission = CanonicalPermission::default();
        for (key, value) in &root {
            if key != "permissions" {
                metadata.insert(metadata_key(CLAUDE, key), value.clone());
            }
        }
        if let Some(Json::Object(perms)) = root.get("permissions") {
            permission.allow = string_set(perms.get("allow"));
            permission.deny = string_set(perms.get("deny"));
            permission.ask = string_set(perms.get("ask"));
            permission.default_mode = perms
                .get("defaultMode")
                .and_then(Json::as_str)
                .map(str::to_string);
            let extra: Map<String, Json> = perms
                .iter()
                .filter(|(k, _)| !matches!(k.as_str(), "allow" | "deny" | "ask" | "defaultMode"))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            if !extra.is_empty() {
                metadata.insert(metadata_key(CLAUDE, "permissions_extra"), Json::Object(extra));
            }
        }
        permission.metadata = metadata;
        Ok(permission)
    }

    fn render_agent(&self, agent: &CanonicalAgent) -> Result<String> {
        let mut fm = Mapping::new();
        fm.insert(Yaml::from("name"), Yaml::from(agent.name.as_str()));
        if !agent.description.is_empty() {
            fm.insert(Yaml::from("description"), Yaml::from(agent.description.as_str()));
        }
        if !agent.tools.is_empty() {
            fm.insert(Yaml::from("tools"), Yaml::from(agent.tools.join(", ")));
        }
        if let Some(model) = &agent.model {
            fm.insert(Yaml::from("model"), Yaml::from(model.as_str()));
        }
        restore_extra_keys(&agent.metadata, AGENT_KEYS, CLAUDE, &mut fm);
        frontmatter::render(&fm, &agent.instructions)
    }

    fn render_command(&self, command: &CanonicalCommand) -> Result<String> {
        let mut fm = Mapping::new();
        if let Some(description) = &command.description {
            fm.insert(Yaml::from("description"), Yaml::from(description.as_str()));
        }
        if let Some(hint) = &command.argument_hint {
            fm.insert(Yaml::from("argument-hint"), Yaml::from(hint.as_str()));
        }
        if let Some(model) = &command.model {
            fm.insert(Yaml::from("model"), Yaml::from(model.as_str()));
        }
        restore_extra_keys(&command.metadata, COMMAND_KEYS, CLAUDE, &mut fm);
        frontmatter::render(&fm, &command.body)
    }

    fn render_permission(&self, permission: &CanonicalPermission) -> Result<String> {
        let mut perms = Map::new();
        perms.insert("allow".into(), json!(permission.allow));
        perms.insert("deny".into(), json!(permission.deny));
        perms.insert("ask".into(), json!(permission.ask));
        if let Some(mode) = &permission.default_mode {
            perms.insert("defaultMode".into(), json!(mode));
        }
        if let Some(Json::Object(extra)) = permission.get_metadata("claude_permissions_extra") {
            for (key, value) in extra {
                perms.insert(key.clone(), value.clone());
            }
        }

        let mut root = Map::new();
        let prefix = format!("{CLAUDE}_");
        for (key, value) in &permission.metadata {
            if let Some(field) = key.strip_prefix(&prefix) {
                if field != "permissions_extra" && field != "permissions" {
                    root.insert(field.to_string(), value.clone());
                }
            }
        }
        root.insert("permissions".into(), Json::Object(perms));
        serde_json::to_string_pretty(&Json::Object(root))
            .map_err(|e| SyncError::parse(format!("failed to render settings JSON: {e}")))
            .map(|mut s| {
                s.push('\n');
                s
            })
    }
}

impl FormatAdapter for ClaudeAdapter {
    fn name(&self) -> &'static str {
        CLAUDE
    }

    fn file_extension(&self, kind: ConfigKind) -> &'static str {
        match kind {
            ConfigKind::Agent | ConfigKind::SlashCommand => "md",
            ConfigKind::Permission => "json",
        }
    }

    fn supported_kinds(&self) -> &'static [ConfigKind] {
        &[ConfigKind::Agent, ConfigKind::Permission, ConfigKind::SlashCommand]
    }

    fn field_support(&self, _kind: ConfigKind) -> FieldSupport {
        FieldSupport::full()
    }

    fn parse(&self, kind: ConfigKind, content: &str, path: &Path) -> Result<CanonicalRecord> {
        let record = match kind {
            ConfigKind::Agent => self
                .parse_agent(content, path)
                .map(CanonicalRecord::Agent),
            ConfigKind::Permission => self
                .parse_permission(content)
                .map(CanonicalRecord::Permission),
            ConfigKind::SlashCommand => self
                .parse_command(content, path)
                .map(CanonicalRecord::SlashCommand),
        };
        record.map_err(|e| e.with_path(path))
    }

    fn render(&self, record: &CanonicalRecord) -> Result<String> {
        match record {
            CanonicalRecord::Agent(a) => self.render_agent(a),
            CanonicalRecord::Permission(p) => self.render_permission(p),
            CanonicalRecord::SlashCommand(c) => self.render_command(c),
        }
    }
}
