//! Project config files (`sker.json`).
//!
//! A project config is a JSON5 object. Only primitive values are kept and
//! the result always carries a `name`, falling back to the folder name.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ContextError, Result};

/// File name that marks a folder as a project root.
pub const PROJECT_CONFIG_FILE: &str = "sker.json";

/// A primitive config value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl ConfigValue {
    /// String view of the value, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Flattened project metadata read from a project config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Project name.
    pub name: String,

    /// Every other primitive field.
    #[serde(flatten)]
    pub fields: BTreeMap<String, ConfigValue>,
}

impl ProjectInfo {
    /// Name-only metadata used when a config cannot be parsed.
    pub fn fallback(folder_name: impl Into<String>) -> Self {
        Self {
            name: folder_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Look up a field other than `name`.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.fields.get(key)
    }

    /// The `version` field, if present as a string.
    pub fn version(&self) -> Option<&str> {
        self.get("version").and_then(ConfigValue::as_str)
    }

    /// The `description` field, if present as a string.
    pub fn description(&self) -> Option<&str> {
        self.get("description").and_then(ConfigValue::as_str)
    }

    /// Parse config text.
    ///
    /// Fails on malformed JSON5 or when the top level is not an object.
    /// A missing or non-string `name` is replaced by `folder_name`.
    pub fn parse(text: &str, folder_name: &str) -> std::result::Result<Self, String> {
        let value: Value = json5::from_str(text).map_err(|e| e.to_string())?;

        let Value::Object(map) = value else {
            return Err("project config must be an object".to_string());
        };

        let mut name = None;
        let mut fields = BTreeMap::new();

        for (key, value) in map {
            let primitive = match value {
                Value::Bool(b) => ConfigValue::Bool(b),
                Value::Number(n) => match n.as_f64() {
                    Some(n) => ConfigValue::Number(n),
                    None => continue,
                },
                Value::String(s) => ConfigValue::String(s),
                Value::Null | Value::Array(_) | Value::Object(_) => {
                    debug!("Dropping non-primitive project config field '{key}'");
                    continue;
                }
            };

            if key == "name" {
                if let ConfigValue::String(s) = primitive {
                    name = Some(s);
                }
                continue;
            }
            fields.insert(key, primitive);
        }

        Ok(Self {
            name: name.unwrap_or_else(|| folder_name.to_string()),
            fields,
        })
    }
}

/// Name of the folder containing `config_path`.
pub fn folder_name_of(config_path: &Path) -> String {
    config_path
        .parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read and parse a project config file.
pub async fn load_project_config(config_path: &Path) -> Result<ProjectInfo> {
    let text = tokio::fs::read_to_string(config_path).await?;
    ProjectInfo::parse(&text, &folder_name_of(config_path)).map_err(|message| {
        ContextError::ConfigInvalid {
            path: config_path.to_path_buf(),
            message,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_json5_config() {
        let text = r#"{
            // comments and trailing commas are fine
            name: 'web-app',
            version: "1.2.0",
            private: true,
            port: 8080,
            nested: { ignored: 1 },
        }"#;

        let info = ProjectInfo::parse(text, "folder").unwrap();
        assert_eq!(info.name, "web-app");
        assert_eq!(info.version(), Some("1.2.0"));
        assert_eq!(info.get("private"), Some(&ConfigValue::Bool(true)));
        assert_eq!(info.get("port"), Some(&ConfigValue::Number(8080.0)));
        assert!(info.get("nested").is_none());
    }

    #[test]
    fn test_missing_name_uses_folder_name() {
        let info = ProjectInfo::parse("{ description: 'x' }", "my-folder").unwrap();
        assert_eq!(info.name, "my-folder");
        assert_eq!(info.description(), Some("x"));
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        assert!(ProjectInfo::parse("{ name: ", "f").is_err());
        assert!(ProjectInfo::parse("[1, 2]", "f").is_err());
    }

    #[test]
    fn test_serializes_flat() {
        let mut info = ProjectInfo::fallback("demo");
        info.fields
            .insert("version".to_string(), ConfigValue::String("0.1.0".to_string()));

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "demo", "version": "0.1.0" }));
    }

    #[test]
    fn test_folder_name_of() {
        assert_eq!(folder_name_of(Path::new("/work/app/sker.json")), "app");
    }
}
