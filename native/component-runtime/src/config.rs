use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Naming conventions shared by every element in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// Appended to the component type name to form the template resource name.
    pub template_suffix: String,
    /// Prefixes that mark a resource reference as relative to the component.
    pub relative_prefixes: Vec<String>,
    /// Attributes inspected by the path resolver.
    pub resource_attributes: Vec<String>,
    /// Prefix of the style registry slot id, followed by the type name.
    pub style_id_prefix: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            template_suffix: ".html".to_string(),
            relative_prefixes: vec!["./".to_string(), "../".to_string()],
            resource_attributes: vec!["src".to_string()],
            style_id_prefix: "style-".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&data)
    }

    pub fn style_id(&self, type_name: &str) -> String {
        format!("{}{}", self.style_id_prefix, type_name)
    }

    pub fn is_relative(&self, reference: &str) -> bool {
        self.relative_prefixes
            .iter()
            .any(|prefix| reference.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RuntimeConfig::from_json(r#"{ "templateSuffix": ".tpl.html" }"#).unwrap();
        assert_eq!(config.template_suffix, ".tpl.html");
        assert_eq!(config.resource_attributes, vec!["src".to_string()]);
        assert_eq!(config.style_id("Card"), "style-Card");
    }

    #[test]
    fn test_invalid_json_is_reported() {
        assert!(matches!(
            RuntimeConfig::from_json("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.json");
        fs::write(&path, r#"{ "relativePrefixes": ["./"] }"#).unwrap();

        let config = RuntimeConfig::from_file(&path).unwrap();
        assert!(config.is_relative("./a.png"));
        assert!(!config.is_relative("../a.png"));
    }
}
