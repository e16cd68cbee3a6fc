//! Sparse cell storage shared by mutations, snapshots and the insertion flow.
//!
//! The layout mirrors the snapshot `cellData` shape: `row -> column -> cell`,
//! with numeric keys serialized as JSON object keys (`{"0": {"2": {"v": 1}}}`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Contents of a single cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellData {
    /// Literal value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<Value>,
    /// Formula text, including the leading `=`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f: Option<String>,
}

impl CellData {
    pub fn value(v: impl Into<Value>) -> Self {
        Self { v: Some(v.into()), f: None }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::value(Value::String(s.into()))
    }

    /// Cell used to express "this cell was empty" in an inverse write.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.f.is_none() && matches!(self.v, None | Some(Value::Null))
    }

    /// Display text for the cell (formula text wins over the cached value).
    pub fn display(&self) -> String {
        match (&self.f, &self.v) {
            (Some(f), _) => f.clone(),
            (None, Some(v)) => display_string(v),
            (None, None) => String::new(),
        }
    }
}

/// Sparse `row -> column -> CellData` map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellValueMap {
    rows: BTreeMap<usize, BTreeMap<usize, CellData>>,
}

impl CellValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, row: usize, col: usize, cell: CellData) {
        self.rows.entry(row).or_default().insert(col, cell);
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&CellData> {
        self.rows.get(&row).and_then(|cols| cols.get(&col))
    }

    pub fn remove(&mut self, row: usize, col: usize) -> Option<CellData> {
        let cols = self.rows.get_mut(&row)?;
        let removed = cols.remove(&col);
        if cols.is_empty() {
            self.rows.remove(&row);
        }
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.rows.values().all(|cols| cols.is_empty())
    }

    /// Number of cells present in the map.
    pub fn len(&self) -> usize {
        self.rows.values().map(|cols| cols.len()).sum()
    }

    /// Iterate cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &CellData)> + '_ {
        self.rows
            .iter()
            .flat_map(|(&r, cols)| cols.iter().map(move |(&c, cell)| (r, c, cell)))
    }

    /// Largest row index and largest column index present.
    ///
    /// Rows and columns are maximized independently: `{0: {0, 2}, 5: {1}}`
    /// yields `(5, 2)`. An empty map yields `(0, 0)`.
    pub fn max_extent(&self) -> (usize, usize) {
        let mut max_row = 0;
        let mut max_col = 0;
        for (&r, cols) in &self.rows {
            if cols.is_empty() {
                continue;
            }
            max_row = max_row.max(r);
            if let Some((&c, _)) = cols.last_key_value() {
                max_col = max_col.max(c);
            }
        }
        (max_row, max_col)
    }

    /// Build a map from a dense grid of display strings anchored at
    /// `(origin_row, origin_col)`.
    pub fn from_grid(origin_row: usize, origin_col: usize, grid: &[Vec<String>]) -> Self {
        let mut map = Self::new();
        for (dr, line) in grid.iter().enumerate() {
            for (dc, text) in line.iter().enumerate() {
                map.set(origin_row + dr, origin_col + dc, CellData::text(text.clone()));
            }
        }
        map
    }
}

/// Render a JSON value the way a grid displays it.
///
/// Strings are taken verbatim, numbers and booleans use their JSON text,
/// `null` becomes empty, and nested arrays/objects are kept as compact JSON.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
