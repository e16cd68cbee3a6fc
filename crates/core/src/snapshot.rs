//! Document snapshot normalization.
//!
//! Templates and uploaded files carry either a complete workbook snapshot or
//! a bare fragment (`{sheets, styles?, sheetOrder?}`). Anything with a
//! `sheets` key is completed here; everything else passes through untouched.

use serde_json::{Map, Value};

/// App version stamped into synthesized snapshots.
pub const SNAPSHOT_APP_VERSION: &str = "0.5.0";

/// Values used for keys a fragment does not provide.
#[derive(Debug, Clone)]
pub struct SnapshotDefaults {
    /// Workbook id. `None` generates a fresh `workbook-<uuid>` id.
    pub id: Option<String>,
    pub name: String,
    pub locale: String,
    pub app_version: String,
}

impl SnapshotDefaults {
    pub fn new(name: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            locale: locale.into(),
            app_version: SNAPSHOT_APP_VERSION.to_string(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    fn workbook_id(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("workbook-{}", uuid::Uuid::new_v4()))
    }
}

/// True when the payload needs completing before it can be loaded.
pub fn is_fragment(payload: &Value) -> bool {
    payload.get("sheets").is_some()
}

/// Turn a template payload into a loadable snapshot.
///
/// Keys already present in a fragment are kept; missing `id`, `name`,
/// `locale`, `appVersion`, `styles` and `sheetOrder` are filled in.
/// `sheetOrder` defaults to the fragment's sheet keys in declaration order.
pub fn normalize_snapshot(payload: Value, defaults: &SnapshotDefaults) -> Value {
    if !is_fragment(&payload) {
        return payload;
    }
    let Value::Object(mut obj) = payload else {
        return payload;
    };

    let sheet_order: Vec<Value> = match obj.get("sheets") {
        Some(Value::Object(sheets)) => sheets.keys().cloned().map(Value::String).collect(),
        _ => Vec::new(),
    };

    insert_missing(&mut obj, "id", || Value::String(defaults.workbook_id()));
    insert_missing(&mut obj, "name", || Value::String(defaults.name.clone()));
    insert_missing(&mut obj, "locale", || Value::String(defaults.locale.clone()));
    insert_missing(&mut obj, "appVersion", || Value::String(defaults.app_version.clone()));
    insert_missing(&mut obj, "styles", || Value::Object(Map::new()));
    insert_missing(&mut obj, "sheetOrder", || Value::Array(sheet_order));

    Value::Object(obj)
}

fn insert_missing(obj: &mut Map<String, Value>, key: &str, make: impl FnOnce() -> Value) {
    match obj.get(key) {
        Some(v) if !v.is_null() => {}
        _ => {
            obj.insert(key.to_string(), make());
        }
    }
}
