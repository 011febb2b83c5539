//! Adapter for the copilot on-disk layout.
//!
//! Agents are `.agent.md` files with YAML frontmatter (tools as a YAML
//! array, fully qualified model ids). Permissions are a JSON map under
//! `"chat.tools.terminal.autoApprove"` where `true` means allow and
//! `false` means ask; there is no deny concept and no slash-command
//! kind, which makes this the main source of lossy downgrades.

use crate::claude::{file_stem, parse_tools};
use crate::frontmatter::{self, Document};
use crate::models::{copilot_model_id, normalize_model};
use crate::value::{json_to_yaml, yaml_to_json};
use serde_json::{json, Map, Value as Json};
use serde_yaml::{Mapping, Value as Yaml};
use std::path::Path;
use unisync_core::{
    metadata_key, CanonicalAgent, CanonicalPermission, CanonicalRecord, ConfigKind, FieldSupport,
    FormatAdapter, Metadata, Result, SyncError,
};

pub const COPILOT: &str = "copilot";

const AUTO_APPROVE: &str = "chat.tools.terminal.autoApprove";
const AGENT_KEYS: &[&str] = &["name", "description", "tools", "model"];

#[derive(Debug, Default)]
pub struct CopilotAdapter;

impl CopilotAdapter {
    fn parse_agent(&self, content: &str, path: &Path) -> Result<CanonicalAgent> {
        let Document { frontmatter, body } = frontmatter::split(content)?;
        let fm = frontmatter.unwrap_or_default();
        let mut metadata = Metadata::new();
        for (key, value) in &fm {
            let Some(key) = key.as_str() else { continue };
            if !AGENT_KEYS.contains(&key) {
                metadata.insert(metadata_key(COPILOT, key), yaml_to_json(value));
            }
        }
        // ".agent" is part of the extension convention, not the name.
        let stem = file_stem(path);
        let default_name = stem.strip_suffix(".agent").unwrap_or(&stem).to_string();
        Ok(CanonicalAgent {
            name: fm
                .get(Yaml::from("name"))
                .and_then(Yaml::as_str)
                .map(str::to_string)
                .unwrap_or(default_name),
            description: fm
                .get(Yaml::from("description"))
                .and_then(Yaml::as_str)
                .unwrap_or_default()
                .to_string(),
            instructions: body,
            tools: fm
                .get(Yaml::from("tools"))
                .map(parse_tools)
                .unwrap_or_default(),
            model: fm
                .get(Yaml::from("model"))
                .and_then(Yaml::as_str)
                .map(normalize_model),
            metadata,
            source_format: None,
        })
    }

    fn parse_permission(&self, content: &str) -> Result<CanonicalPermission> {
        let root: Json = serde_json::from_str(content)
            .map_err(|e| SyncError::parse(format!("invalid permission JSON: {e}")))?;
        let Json::Object(root) = root else {
            return Err(SyncError::parse("permission JSON must be an object"));
        };
        let mut permission = CanonicalPermission::default();
        for (key, value) in &root {
            if key != AUTO_APPROVE {
                permission
                    .metadata
                    .insert(metadata_key(COPILOT, key), value.clone());
            }
        }
        if let Some(Json::Object(map)) = root.get(AUTO_APPROVE) {
            for (pattern, approved) in map {
                match approved.as_bool() {
                    Some(true) => {
                        permission.allow.insert(pattern.clone());
                    }
                    Some(false) => {
                        permission.ask.insert(pattern.clone());
                    }
                    None => {
                        return Err(SyncError::parse(format!(
                            "autoApprove entry '{pattern}' must be a boolean"
                        )));
                    }
                }
            }
        }
        Ok(permission)
    }

    fn render_agent(&self, agent: &CanonicalAgent) -> Result<String> {
        let mut fm = Mapping::new();
        fm.insert(Yaml::from("name"), Yaml::from(agent.name.as_str()));
        if !agent.description.is_empty() {
            fm.insert(Yaml::from("description"), Yaml::from(agent.description.as_str()));
        }
        if !agent.tools.is_empty() {
            fm.insert(
                Yaml::from("tools"),
                Yaml::Sequence(agent.tools.iter().map(|t| Yaml::from(t.as_str())).collect()),
            );
        }
        if let Some(model) = &agent.model {
            fm.insert(Yaml::from("model"), Yaml::from(copilot_model_id(model)));
        }
        let prefix = format!("{COPILOT}_");
        for (key, value) in &agent.metadata {
            if let Some(field) = key.strip_prefix(&prefix) {
                if !AGENT_KEYS.contains(&field) {
                    fm.insert(Yaml::from(field), json_to_yaml(value));
                }
            }
        }
        frontmatter::render(&fm, &agent.instructions)
    }

    fn render_permission(&self, permission: &CanonicalPermission) -> Result<String> {
        let mut map = Map::new();
        for pattern in &permission.allow {
            map.insert(pattern.clone(), json!(true));
        }
        for pattern in &permission.ask {
            map.insert(pattern.clone(), json!(false));
        }

        let mut root = Map::new();
        let prefix = format!("{COPILOT}_");
        for (key, value) in &permission.metadata {
            if let Some(field) = key.strip_prefix(&prefix) {
                if field != AUTO_APPROVE {
                    root.insert(field.to_string(), value.clone());
                }
            }
        }
        root.insert(AUTO_APPROVE.into(), Json::Object(map));
        serde_json::to_string_pretty(&Json::Object(root))
            .map_err(|e| SyncError::parse(format!("failed to render permission JSON: {e}")))
            .map(|mut s| {
                s.push('\n');
                s
            })
    }
}

impl FormatAdapter for CopilotAdapter {
    fn name(&self) -> &'static str {
        COPILOT
    }

    fn file_extension(&self, kind: ConfigKind) -> &'static str {
        match kind {
            ConfigKind::Agent => "agent.md",
            ConfigKind::Permission => "json",
            ConfigKind::SlashCommand => "md",
        }
    }

    fn supported_kinds(&self) -> &'static [ConfigKind] {
        &[ConfigKind::Agent, ConfigKind::Permission]
    }

    fn field_support(&self, kind: ConfigKind) -> FieldSupport {
        match kind {
            ConfigKind::Permission => FieldSupport {
                allow_rules: true,
                ask_rules: true,
                deny_rules: false,
                default_mode: false,
                ..FieldSupport::default()
            },
            _ => FieldSupport {
                description: true,
                instructions: true,
                tools: true,
                model: true,
                ..FieldSupport::default()
            },
        }
    }

    fn parse(&self, kind: ConfigKind, content: &str, path: &Path) -> Result<CanonicalRecord> {
        let record = match kind {
            ConfigKind::Agent => self.parse_agent(content, path).map(CanonicalRecord::Agent),
            ConfigKind::Permission => self
                .parse_permission(content)
                .map(CanonicalRecord::Permission),
            ConfigKind::SlashCommand => Err(SyncError::UnsupportedKind {
                format: COPILOT.to_string(),
                kind,
            }),
        };
        record.map_err(|e| e.with_path(path))
    }

    fn render(&self, record: &CanonicalRecord) -> Result<String> {
        match record {
            CanonicalRecord::Agent(a) => self.render_agent(a),
            CanonicalRecord::Permission(p) => self.render_permission(p),
            CanonicalRecord::SlashCommand(_) => Err(SyncError::UnsupportedKind {
                format: COPILOT.to_string(),
                kind: ConfigKind::SlashCommand,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> CopilotAdapter {
        CopilotAdapter
    }

    #[test]
    fn agent_round_trips_with_array_tools() {
        let content =
            "---\nname: planner\ndescription: plans work\ntools:\n- read\n- edit\nmodel: claude-sonnet-4.5\n---\nPlan carefully.\n";
        let record = adapter()
            .parse(ConfigKind::Agent, content, Path::new("planner.agent.md"))
            .unwrap();
        let CanonicalRecord::Agent(agent) = &record else {
            panic!("expected agent");
        };
        assert_eq!(agent.tools, vec!["read", "edit"]);
        // Model ids are normalized to the short alias on the way in.
        assert_eq!(agent.model.as_deref(), Some("sonnet"));

        let rendered = adapter().render(&record).unwrap();
        assert!(rendered.contains("model: claude-sonnet-4.5"));
        let again = adapter()
            .parse(ConfigKind::Agent, &rendered, Path::new("planner.agent.md"))
            .unwrap();
        assert_eq!(again, record);
    }

    #[test]
    fn agent_name_strips_agent_suffix_from_stem() {
        let record = adapter()
            .parse(ConfigKind::Agent, "Body only.\n", Path::new("reviewer.agent.md"))
            .unwrap();
        assert_eq!(record.name(), Some("reviewer"));
    }

    #[test]
    fn auto_approve_maps_to_allow_and_ask() {
        let content = r#"{
  "chat.tools.terminal.autoApprove": {
    "git status": true,
    "rm -rf": false
  }
}"#;
        let record = adapter()
            .parse(ConfigKind::Permission, content, Path::new("settings.json"))
            .unwrap();
        let CanonicalRecord::Permission(perm) = &record else {
            panic!("expected permission");
        };
        assert!(perm.allow.contains("git status"));
        assert!(perm.ask.contains("rm -rf"));
        assert!(perm.deny.is_empty());
    }

    #[test]
    fn permission_render_round_trips() {
        let mut perm = CanonicalPermission::default();
        perm.allow.insert("git status".into());
        perm.ask.insert("rm -rf".into());
        perm.set_metadata(metadata_key(COPILOT, "chat.agent.enabled"), json!(true));
        let record = CanonicalRecord::Permission(perm);
        let rendered = adapter().render(&record).unwrap();
        assert!(rendered.contains("\"git status\": true"));
        assert!(rendered.contains("\"rm -rf\": false"));
        assert!(rendered.contains("\"chat.agent.enabled\": true"));
        let again = adapter()
            .parse(ConfigKind::Permission, &rendered, Path::new("settings.json"))
            .unwrap();
        assert_eq!(again, record);
    }

    #[test]
    fn non_boolean_auto_approve_entry_is_rejected() {
        let content = r#"{"chat.tools.terminal.autoApprove": {"git status": "yes"}}"#;
        let err = adapter()
            .parse(ConfigKind::Permission, content, Path::new("settings.json"))
            .unwrap_err();
        assert!(matches!(err, SyncError::Parse { .. }));
    }

    #[test]
    fn slash_commands_are_unsupported() {
        let err = adapter()
            .parse(ConfigKind::SlashCommand, "Body.", Path::new("review.md"))
            .unwrap_err();
        assert!(matches!(err, SyncError::UnsupportedKind { .. }));
    }

    #[test]
    fn permission_support_has_no_deny() {
        let support = adapter().field_support(ConfigKind::Permission);
        assert!(support.allow_rules);
        assert!(support.ask_rules);
        assert!(!support.deny_rules);
    }

    #[test]
    fn agent_support_covers_content_fields_only() {
        let support = adapter().field_support(ConfigKind::Agent);
        assert!(support.description && support.instructions && support.tools && support.model);
        assert!(!support.argument_hint);
        assert!(!support.allow_rules && !support.deny_rules && !support.ask_rules);
        assert!(!support.default_mode);
    }
}
