//! Conversions between serde_yaml / toml values and the JSON values used
//! by the canonical metadata side-table.

use serde_json::{json, Value as Json};
use serde_yaml::Value as Yaml;
use toml::Value as Toml;

pub fn yaml_to_json(value: &Yaml) -> Json {
    match value {
        Yaml::Null => Json::Null,
        Yaml::Bool(b) => Json::Bool(*b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!(i)
            } else if let Some(u) = n.as_u64() {
                json!(u)
            } else {
                n.as_f64().map(|f| json!(f)).unwrap_or(Json::Null)
            }
        }
        Yaml::String(s) => Json::String(s.clone()),
        Yaml::Sequence(seq) => Json::Array(seq.iter().map(yaml_to_json).collect()),
        Yaml::Mapping(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    Yaml::String(s) => s.clone(),
                    other => yaml_to_json(other).to_string(),
                };
                out.insert(key, yaml_to_json(v));
            }
            Json::Object(out)
        }
        // Tags carry no meaning for config files; keep the inner value.
        Yaml::Tagged(tagged) => yaml_to_json(&tagged.value),
    }
}

pub fn json_to_yaml(value: &Json) -> Yaml {
    match value {
        Json::Null => Yaml::Null,
        Json::Bool(b) => Yaml::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Yaml::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Yaml::Number(u.into())
            } else {
                n.as_f64().map(|f| Yaml::Number(f.into())).unwrap_or(Yaml::Null)
            }
        }
        Json::String(s) => Yaml::String(s.clone()),
        Json::Array(items) => Yaml::Sequence(items.iter().map(json_to_yaml).collect()),
        Json::Object(map) => {
            let mut out = serde_yaml::Mapping::new();
            for (k, v) in map {
                out.insert(Yaml::String(k.clone()), json_to_yaml(v));
            }
            Yaml::Mapping(out)
        }
    }
}

pub fn toml_to_json(value: &Toml) -> Json {
    match value {
        Toml::String(s) => Json::String(s.clone()),
        Toml::Integer(i) => json!(i),
        Toml::Float(f) => json!(f),
        Toml::Boolean(b) => Json::Bool(*b),
        Toml::Datetime(dt) => Json::String(dt.to_string()),
        Toml::Array(items) => Json::Array(items.iter().map(toml_to_json).collect()),
        Toml::Table(table) => {
            let mut out = serde_json::Map::new();
            for (k, v) in table {
                out.insert(k.clone(), toml_to_json(v));
            }
            Json::Object(out)
        }
    }
}

pub fn json_to_toml(value: &Json) -> Option<Toml> {
    match value {
        // TOML has no null; callers skip such keys.
        Json::Null => None,
        Json::Bool(b) => Some(Toml::Boolean(*b)),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Toml::Integer(i))
            } else {
                n.as_f64().map(Toml::Float)
            }
        }
        Json::String(s) => Some(Toml::String(s.clone())),
        Json::Array(items) => Some(Toml::Array(
            items.iter().filter_map(json_to_toml).collect(),
        )),
        Json::Object(map) => {
            let mut out = toml::map::Map::new();
            for (k, v) in map {
                if let Some(v) = json_to_toml(v) {
                    out.insert(k.clone(), v);
                }
            }
            Some(Toml::Table(out))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_scalars_round_trip() {
        let yaml: Yaml = serde_yaml::from_str("{name: planner, count: 3, on: true}").unwrap();
        let json = yaml_to_json(&yaml);
        assert_eq!(json["name"], json!("planner"));
        assert_eq!(json["count"], json!(3));
        assert_eq!(json["on"], json!(true));
        assert_eq!(yaml_to_json(&json_to_yaml(&json)), json);
    }

    #[test]
    fn toml_tables_convert_to_objects() {
        let toml: Toml = "allow = [\"git status\"]\n[nested]\nkey = 1\n".parse().unwrap();
        let json = toml_to_json(&toml);
        assert_eq!(json["allow"], json!(["git status"]));
        assert_eq!(json["nested"]["key"], json!(1));
    }

    #[test]
    fn json_null_is_dropped_for_toml() {
        assert!(json_to_toml(&Json::Null).is_none());
        let obj = json!({"keep": 1, "drop": null});
        let toml = json_to_toml(&obj).unwrap();
        let table = toml.as_table().unwrap();
        assert!(table.contains_key("keep"));
        assert!(!table.contains_key("drop"));
    }
}
