use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A document template as returned by the template service.
///
/// `content` is an opaque snapshot blob; see [`crate::snapshot`] for how it
/// is turned into a loadable document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateData {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub content: Value,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, alias = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Payload for creating or updating a template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub content: Value,
}

impl TemplateDraft {
    pub fn new(name: impl Into<String>, content: Value) -> Self {
        Self { name: name.into(), category: None, content }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}
