// Configuration loading

pub mod endpoints;
pub mod expansion;
pub mod settings;
pub mod store;

pub use endpoints::{DropdownSourceConfig, HttpMethod, TemplateApiConfig, TemplateFieldMapping};
pub use expansion::{ExpansionConfig, PartialExpansionConfig, ViewportRetry};
pub use settings::PluginConfig;
pub use store::ConfigStore;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}
