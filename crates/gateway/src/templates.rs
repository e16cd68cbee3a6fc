// Template record mapping
//
// Servers name their fields differently. The configured mapping wins;
// snake_case and camelCase spellings of the timestamps are accepted as
// fallbacks.

use gridext_config::TemplateFieldMapping;
use gridext_core::{TemplateData, TemplateDraft};
use serde_json::{Map, Value};

/// Build a [`TemplateData`] from one response item. Items without an id
/// are skipped by callers.
pub fn map_template(item: &Value, mapping: &TemplateFieldMapping) -> Option<TemplateData> {
    let obj = item.as_object()?;
    let id = scalar_string(obj.get(&mapping.id)?)?;
    let name = obj
        .get(&mapping.name)
        .and_then(scalar_string)
        .unwrap_or_else(|| id.clone());
    let category = obj.get(&mapping.category).and_then(scalar_string);
    let content = obj.get(&mapping.content).cloned().unwrap_or(Value::Null);

    Some(TemplateData {
        id,
        name,
        category,
        content,
        created_at: timestamp(obj, &mapping.created_at, &["created_at", "createdAt"]),
        updated_at: timestamp(obj, &mapping.updated_at, &["updated_at", "updatedAt"]),
    })
}

/// Request body for save/update, keyed by the mapped field names.
pub fn template_body(draft: &TemplateDraft, mapping: &TemplateFieldMapping) -> Value {
    let mut body = Map::new();
    body.insert(mapping.name.clone(), Value::String(draft.name.clone()));
    if let Some(category) = &draft.category {
        body.insert(mapping.category.clone(), Value::String(category.clone()));
    }
    body.insert(mapping.content.clone(), draft.content.clone());
    Value::Object(body)
}

fn timestamp(obj: &Map<String, Value>, key: &str, fallbacks: &[&str]) -> Option<String> {
    std::iter::once(key)
        .chain(fallbacks.iter().copied())
        .find_map(|k| obj.get(k).and_then(scalar_string))
}

// Ids come back as numbers from some servers.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_mapping_with_snake_case_timestamps() {
        let item = json!({
            "id": "sales",
            "name": "Sales report",
            "category": "finance",
            "content": {"sheets": {}},
            "created_at": "2024-01-01T00:00:00",
            "updated_at": "2024-02-01T00:00:00"
        });
        let t = map_template(&item, &TemplateFieldMapping::default()).unwrap();
        assert_eq!(t.id, "sales");
        assert_eq!(t.category.as_deref(), Some("finance"));
        assert_eq!(t.created_at.as_deref(), Some("2024-01-01T00:00:00"));
        assert_eq!(t.updated_at.as_deref(), Some("2024-02-01T00:00:00"));
        assert_eq!(t.content, json!({"sheets": {}}));
    }

    #[test]
    fn test_custom_mapping_and_numeric_id() {
        let mapping = TemplateFieldMapping {
            id: "templateId".into(),
            name: "title".into(),
            content: "body".into(),
            ..Default::default()
        };
        let item = json!({"templateId": 42, "title": "Budget", "body": {"a": 1}});
        let t = map_template(&item, &mapping).unwrap();
        assert_eq!(t.id, "42");
        assert_eq!(t.name, "Budget");
        assert_eq!(t.content, json!({"a": 1}));
        assert!(t.category.is_none());
        assert!(t.created_at.is_none());
    }

    #[test]
    fn test_missing_id_is_skipped() {
        assert!(map_template(&json!({"name": "x"}), &TemplateFieldMapping::default()).is_none());
        assert!(map_template(&json!("x"), &TemplateFieldMapping::default()).is_none());
    }

    #[test]
    fn test_body_uses_mapped_names() {
        let mapping = TemplateFieldMapping { name: "title".into(), ..Default::default() };
        let draft = TemplateDraft::new("Q1", json!({"sheets": {}})).with_category("finance");
        let body = template_body(&draft, &mapping);
        assert_eq!(body["title"], "Q1");
        assert_eq!(body["category"], "finance");
        assert_eq!(body["content"], json!({"sheets": {}}));
    }
}
