// Plugin settings
// Loaded from ~/.config/gridext/config.json (or .toml)

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::endpoints::{DropdownSourceConfig, TemplateApiConfig, ID_PLACEHOLDER};
use crate::expansion::ExpansionConfig;
use crate::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_LOCALE: &str = "en-US";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PluginConfig {
    // Remote data
    pub api_base_url: String,
    pub dropdown_sources: Vec<DropdownSourceConfig>,
    pub template_api: Option<TemplateApiConfig>,
    pub request_timeout_secs: u64,

    // Grid behavior
    pub expansion: ExpansionConfig,

    // UI
    pub locale: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            dropdown_sources: Vec::new(),
            template_api: None,
            request_timeout_secs: 15,
            expansion: ExpansionConfig::default(),
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl PluginConfig {
    /// Get the config file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gridext");
        config_dir.join("config.json")
    }

    /// Parse config text. Missing keys take their defaults; `//` comment
    /// lines are allowed in JSON.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let cleaned: String = text
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        let mut config: Self = serde_json::from_str(&cleaned)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.expansion.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.expansion.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file. `.toml` files are parsed as TOML,
    /// everything else as JSON.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;

        let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
        if is_toml {
            Self::from_toml_str(&contents)
        } else {
            Self::from_json_str(&contents)
        }
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Error loading {}: {}", path.display(), e);
                log::warn!("Using default config");
                Self::default()
            }
        }
    }

    /// Save current config as pretty JSON
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Check structural invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for source in &self.dropdown_sources {
            if source.id.trim().is_empty() {
                return Err(ConfigError::Invalid("dropdown source with empty id".into()));
            }
            if !seen.insert(source.id.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate dropdown source id '{}'", source.id)));
            }
        }

        if let Some(api) = &self.template_api {
            let per_template = [
                ("getEndpoint", Some(&api.get_endpoint)),
                ("updateEndpoint", api.update_endpoint.as_ref()),
                ("deleteEndpoint", api.delete_endpoint.as_ref()),
            ];
            for (key, endpoint) in per_template {
                if let Some(endpoint) = endpoint {
                    if !endpoint.contains(ID_PLACEHOLDER) {
                        return Err(ConfigError::Invalid(format!(
                            "templateApi.{} must contain {}", key, ID_PLACEHOLDER
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    pub fn dropdown_source(&self, id: &str) -> Option<&DropdownSourceConfig> {
        self.dropdown_sources.iter().find(|s| s.id == id)
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::HttpMethod;

    #[test]
    fn test_empty_object_is_all_defaults() {
        let config = PluginConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PluginConfig::default());
    }

    #[test]
    fn test_json_with_comments() {
        let text = r#"{
            // where the API lives
            "apiBaseUrl": "https://api.example.test",
            "dropdownSources": [
                {"id": "products", "name": "Products", "endpoint": "/dropdown/products"},
                {"id": "search", "name": "Search", "endpoint": "/search", "method": "POST",
                 "headers": {"X-Api-Key": "k"}}
            ],
            "templateApi": {"listEndpoint": "/templates", "getEndpoint": "/templates/{id}"},
            "expansion": {"rowsToAdd": 20},
            "locale": "vi-VN"
        }"#;
        let config = PluginConfig::from_json_str(text).unwrap();

        assert_eq!(config.api_base_url, "https://api.example.test");
        assert_eq!(config.dropdown_sources.len(), 2);
        assert_eq!(config.dropdown_sources[1].method, HttpMethod::Post);
        assert_eq!(config.dropdown_sources[1].headers["X-Api-Key"], "k");
        assert_eq!(config.expansion.rows_to_add, 20);
        assert_eq!(config.expansion.columns_to_add, 10);
        assert_eq!(config.locale, "vi-VN");
        let api = config.template_api.unwrap();
        assert_eq!(api.field_mapping.created_at, "createdAt");
    }

    #[test]
    fn test_duplicate_source_ids_rejected() {
        let text = r#"{"dropdownSources": [
            {"id": "a", "name": "A", "endpoint": "/a"},
            {"id": "a", "name": "A again", "endpoint": "/a2"}
        ]}"#;
        let err = PluginConfig::from_json_str(text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn test_get_endpoint_requires_placeholder() {
        let text = r#"{"templateApi": {"listEndpoint": "/t", "getEndpoint": "/t/one"}}"#;
        assert!(matches!(PluginConfig::from_json_str(text), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_toml_and_round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("config.toml");
        fs::write(
            &toml_path,
            "apiBaseUrl = \"http://h\"\nlocale = \"fr-FR\"\n\n[expansion]\ntriggerThreshold = 1\n",
        )
        .unwrap();

        let config = PluginConfig::load_from(&toml_path).unwrap();
        assert_eq!(config.api_base_url, "http://h");
        assert_eq!(config.expansion.trigger_threshold, 1);

        let json_path = dir.path().join("nested/config.json");
        config.save_to(&json_path).unwrap();
        assert_eq!(PluginConfig::load_from(&json_path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = PluginConfig::load_from(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
