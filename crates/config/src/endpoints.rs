// Remote endpoint descriptors (dropdown sources, template API)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// HTTP method used for a dropdown source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// One configured source of importable rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropdownSourceConfig {
    /// Unique within the configured list.
    pub id: String,
    pub name: String,
    /// Path appended to the base API URL (or an absolute URL).
    pub endpoint: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Field shown to the user when items are listed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_field: Option<String>,
    /// Field treated as the item's value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DropdownSourceConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            endpoint: endpoint.into(),
            method: HttpMethod::Get,
            headers: BTreeMap::new(),
            display_field: None,
            value_field: None,
            description: None,
        }
    }
}

/// Names of the response fields that populate a template record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplateFieldMapping {
    pub id: String,
    pub name: String,
    pub category: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Default for TemplateFieldMapping {
    fn default() -> Self {
        Self {
            id: "id".into(),
            name: "name".into(),
            category: "category".into(),
            content: "content".into(),
            created_at: "createdAt".into(),
            updated_at: "updatedAt".into(),
        }
    }
}

/// Placeholder substituted with a template id in per-template endpoints.
pub const ID_PLACEHOLDER: &str = "{id}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateApiConfig {
    pub list_endpoint: String,
    /// Must contain `{id}`.
    pub get_endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_endpoint: Option<String>,
    /// `PUT` target, must contain `{id}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_endpoint: Option<String>,
    /// `DELETE` target, must contain `{id}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_endpoint: Option<String>,
    #[serde(default)]
    pub field_mapping: TemplateFieldMapping,
}

impl TemplateApiConfig {
    pub fn new(list_endpoint: impl Into<String>, get_endpoint: impl Into<String>) -> Self {
        Self {
            list_endpoint: list_endpoint.into(),
            get_endpoint: get_endpoint.into(),
            save_endpoint: None,
            update_endpoint: None,
            delete_endpoint: None,
            field_mapping: TemplateFieldMapping::default(),
        }
    }

    /// Substitute `{id}` into a per-template endpoint.
    pub fn with_id(endpoint: &str, id: &str) -> String {
        endpoint.replace(ID_PLACEHOLDER, id)
    }
}
