//! Template load and save.
//!
//! A template (from the service or an uploaded JSON file) becomes a snapshot
//! and replaces the active document. Failures are reported to the caller;
//! the current document is left as it was.

use std::path::Path;

use gridext_core::{normalize_snapshot, SnapshotDefaults, TemplateData, TemplateDraft};
use gridext_gateway::{GatewayError, RemoteGateway};
use serde_json::Value;

use crate::host::{HostError, HostGridFacade};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TemplateError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("template '{0}' not found")]
    NotFound(String),
    #[error("malformed template file: {0}")]
    Malformed(String),
    #[error("document rejected: {0}")]
    Host(#[from] HostError),
    #[error("no active document to save")]
    NoDocument,
}

/// Summary of a replaced document.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub id: String,
    pub name: String,
    pub sheet_count: usize,
}

impl LoadedDocument {
    fn from_snapshot(snapshot: &Value) -> Self {
        let text = |key: &str| snapshot.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
        Self {
            id: text("id"),
            name: text("name"),
            sheet_count: snapshot.get("sheets").and_then(Value::as_object).map_or(0, |s| s.len()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TemplateLoader {
    locale: String,
}

impl TemplateLoader {
    pub fn new(locale: impl Into<String>) -> Self {
        Self { locale: locale.into() }
    }

    /// Snapshot for a template record; fragments are completed.
    pub fn snapshot_for(&self, template: &TemplateData) -> Value {
        let defaults = SnapshotDefaults::new(template.name.clone(), self.locale.clone());
        normalize_snapshot(template.content.clone(), &defaults)
    }

    /// Parse an uploaded file's text. `name` is used when the payload has none.
    pub fn snapshot_from_text(&self, text: &str, name: &str) -> Result<Value, TemplateError> {
        let payload: Value = serde_json::from_str(text).map_err(|e| TemplateError::Malformed(e.to_string()))?;
        if !payload.is_object() {
            return Err(TemplateError::Malformed("expected a JSON object".into()));
        }
        Ok(normalize_snapshot(payload, &SnapshotDefaults::new(name, self.locale.clone())))
    }

    /// Fetch a template by id and load it.
    pub fn load_remote(
        &self,
        gateway: &RemoteGateway,
        id: &str,
        host: &mut dyn HostGridFacade,
    ) -> Result<LoadedDocument, TemplateError> {
        let template = gateway.try_get_template(id).map_err(|e| match e {
            e if e.is_not_found() => TemplateError::NotFound(id.to_string()),
            e => TemplateError::Gateway(e),
        })?;
        self.load(&template, host)
    }

    /// Load an already fetched template.
    pub fn load(&self, template: &TemplateData, host: &mut dyn HostGridFacade) -> Result<LoadedDocument, TemplateError> {
        self.replace(self.snapshot_for(template), host)
    }

    /// Load a JSON file from disk. The file stem names synthesized documents.
    pub fn load_file(&self, path: &Path, host: &mut dyn HostGridFacade) -> Result<LoadedDocument, TemplateError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| TemplateError::Malformed(format!("{}: {}", path.display(), e)))?;
        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("Untitled");
        self.replace(self.snapshot_from_text(&text, name)?, host)
    }

    fn replace(&self, snapshot: Value, host: &mut dyn HostGridFacade) -> Result<LoadedDocument, TemplateError> {
        let loaded = LoadedDocument::from_snapshot(&snapshot);
        host.replace_document(snapshot)?;
        log::info!("loaded document '{}' ({} sheet(s))", loaded.name, loaded.sheet_count);
        Ok(loaded)
    }

    /// Save the active document to the template service.
    pub fn save_current(
        &self,
        gateway: &RemoteGateway,
        host: &dyn HostGridFacade,
        name: &str,
        category: Option<&str>,
    ) -> Result<TemplateData, TemplateError> {
        let snapshot = host.export_snapshot().ok_or(TemplateError::NoDocument)?;
        let mut draft = TemplateDraft::new(name, snapshot);
        if let Some(category) = category {
            draft = draft.with_category(category);
        }
        let saved = gateway.try_save_template(&draft)?;
        log::info!("saved template '{}' as {}", saved.name, saved.id);
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHost;
    use gridext_config::{PluginConfig, TemplateApiConfig};
    use gridext_core::SheetRef;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::Arc;

    fn gateway(server: &MockServer) -> RemoteGateway {
        let mut api = TemplateApiConfig::new("/templates", "/templates/{id}");
        api.save_endpoint = Some("/templates".into());
        let config = PluginConfig {
            api_base_url: server.base_url(),
            template_api: Some(api),
            ..Default::default()
        };
        RemoteGateway::new(Arc::new(config)).unwrap()
    }

    fn template(content: Value) -> TemplateData {
        TemplateData {
            id: "t1".into(),
            name: "Budget".into(),
            category: None,
            content,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_fragment_is_completed() {
        let loader = TemplateLoader::new("en-US");
        let snap = loader.snapshot_for(&template(json!({"sheets": {"s1": {}}})));
        assert_eq!(snap["sheetOrder"], json!(["s1"]));
        assert_eq!(snap["styles"], json!({}));
        assert_eq!(snap["name"], "Budget");
        assert!(snap["id"].as_str().unwrap().starts_with("workbook-"));
    }

    #[test]
    fn test_full_snapshot_passes_through() {
        let loader = TemplateLoader::new("en-US");
        let content = json!({"id": "wb", "cells": [1, 2]});
        assert_eq!(loader.snapshot_for(&template(content.clone())), content);
    }

    #[test]
    fn test_load_replaces_document() {
        let loader = TemplateLoader::new("en-US");
        let mut host = MemoryHost::new("old", 10, 10);
        let content = json!({"sheets": {"s1": {"name": "Plan", "rowCount": 40,
                             "cellData": {"0": {"0": {"v": "Item"}}}}}});

        let loaded = loader.load(&template(content), &mut host).unwrap();
        assert_eq!(loaded.sheet_count, 1);
        assert_eq!(loaded.name, "Budget");

        let sheet = host.active_sheet().unwrap();
        assert_eq!(sheet.sheet_id, "s1");
        assert_eq!(host.bounds(&sheet).unwrap().row_count, 40);
        assert_eq!(host.cell(&sheet, 0, 0).unwrap().display(), "Item");
    }

    #[test]
    fn test_malformed_file_leaves_document() {
        let loader = TemplateLoader::new("en-US");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut host = MemoryHost::new("book", 10, 10);
        assert!(matches!(loader.load_file(&path, &mut host), Err(TemplateError::Malformed(_))));
        assert_eq!(host.active_sheet(), Some(SheetRef::new("book", "sheet-01")));

        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(loader.load_file(&path, &mut host), Err(TemplateError::Malformed(_))));
    }

    #[test]
    fn test_host_refusal_is_reported() {
        let loader = TemplateLoader::new("en-US");
        let mut host = MemoryHost::new("book", 10, 10);
        let err = loader.load(&template(json!({"sheets": {}})), &mut host).unwrap_err();
        assert!(matches!(err, TemplateError::Host(HostError::InvalidSnapshot(_))));
        assert_eq!(host.unit_id(), "book");
    }

    #[test]
    fn test_load_file_uses_stem_as_name() {
        let loader = TemplateLoader::new("vi-VN");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.json");
        std::fs::write(&path, r#"{"sheets": {"a": {}, "b": {}}}"#).unwrap();

        let mut host = MemoryHost::new("book", 10, 10);
        let loaded = loader.load_file(&path, &mut host).unwrap();
        assert_eq!(loaded.name, "inventory");
        assert_eq!(loaded.sheet_count, 2);
        assert_eq!(host.export_snapshot().unwrap()["locale"], "vi-VN");
    }

    #[test]
    fn test_load_remote_and_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/templates/sales");
            then.status(200).json_body(json!({
                "id": "sales", "name": "Sales", "content": {"sheets": {"q1": {}}}
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/templates/gone");
            then.status(404).json_body(json!({"detail": "Template not found"}));
        });

        let gw = gateway(&server);
        let loader = TemplateLoader::new("en-US");
        let mut host = MemoryHost::new("book", 10, 10);

        let loaded = loader.load_remote(&gw, "sales", &mut host).unwrap();
        assert_eq!(loaded.name, "Sales");
        assert_eq!(host.active_sheet().unwrap().sheet_id, "q1");

        let err = loader.load_remote(&gw, "gone", &mut host).unwrap_err();
        assert_eq!(err, TemplateError::NotFound("gone".into()));
        assert_eq!(host.active_sheet().unwrap().sheet_id, "q1");
    }

    #[test]
    fn test_save_current_posts_snapshot() {
        let server = MockServer::start();
        let save = server.mock(|when, then| {
            when.method(POST).path("/templates");
            then.status(200).json_body(json!({"id": "q1", "name": "Q1", "content": {}}));
        });

        let host = MemoryHost::new("book", 10, 10);
        let saved = TemplateLoader::new("en-US")
            .save_current(&gateway(&server), &host, "Q1", Some("finance"))
            .unwrap();
        save.assert();
        assert_eq!(saved.id, "q1");

        let empty = MemoryHost::empty("none");
        let err = TemplateLoader::new("en-US").save_current(&gateway(&server), &empty, "x", None);
        assert_eq!(err, Err(TemplateError::NoDocument));
    }
}
