//! In-memory host.
//!
//! A complete [`HostGridFacade`] without a GUI: sheets with bounds and sparse
//! cells, per-sheet selection, an undo/redo stack for tracked mutations,
//! event fan-out, and snapshot import/export. The CLI runs the extensions
//! against it and tests use it to observe every mutation issued.

use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use gridext_core::{
    CellData, CellRange, CellValueMap, GridBounds, History, Mutation, MutationKind, Selection,
    SheetRef,
};
use serde_json::{json, Map, Value};

use crate::events::{
    EventHub, HostEvent, MutationExecutedEvent, ScrollMetrics, SelectionChangedEvent,
    Subscription, Topic,
};
use crate::host::{HostError, HostGridFacade, ViewportProvider};

pub const DEFAULT_ROW_COUNT: usize = 1000;
pub const DEFAULT_COLUMN_COUNT: usize = 20;

#[derive(Debug, Clone)]
struct MemorySheet {
    id: String,
    name: String,
    bounds: GridBounds,
    cells: CellValueMap,
    selection: Selection,
}

impl MemorySheet {
    fn new(id: impl Into<String>, name: impl Into<String>, bounds: GridBounds) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bounds,
            cells: CellValueMap::new(),
            selection: Selection::new(0, 0),
        }
    }

    fn apply(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::SetRangeValues { cells, .. } => {
                for (row, col, cell) in cells.iter() {
                    if cell.is_empty() {
                        self.cells.remove(row, col);
                    } else {
                        self.cells.set(row, col, cell.clone());
                    }
                }
                // Writes past the edge grow the sheet to fit.
                if !cells.is_empty() {
                    let (max_row, max_col) = cells.max_extent();
                    self.bounds.row_count = self.bounds.row_count.max(max_row + 1);
                    self.bounds.column_count = self.bounds.column_count.max(max_col + 1);
                }
            }
            Mutation::SetRowCount { row_count, .. } => self.bounds.row_count = *row_count,
            Mutation::SetColumnCount { column_count, .. } => self.bounds.column_count = *column_count,
        }
    }

    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "rowCount": self.bounds.row_count,
            "columnCount": self.bounds.column_count,
            "cellData": self.cells,
            "selection": self.selection.ranges(),
        })
    }

    fn from_json(id: &str, value: &Value) -> Result<Self, HostError> {
        let obj = value
            .as_object()
            .ok_or_else(|| HostError::InvalidSnapshot(format!("sheet '{}' is not an object", id)))?;
        let count = |key: &str, default: usize| {
            obj.get(key)
                .and_then(Value::as_u64)
                .map(|n| n as usize)
                .unwrap_or(default)
        };
        let name = obj.get("name").and_then(Value::as_str).unwrap_or(id);
        let bounds = GridBounds::new(count("rowCount", DEFAULT_ROW_COUNT), count("columnCount", DEFAULT_COLUMN_COUNT));

        let mut sheet = Self::new(id, name, bounds);
        if let Some(cell_data) = obj.get("cellData") {
            sheet.cells = serde_json::from_value(cell_data.clone())
                .map_err(|e| HostError::InvalidSnapshot(format!("sheet '{}' cellData: {}", id, e)))?;
        }
        // Missing or unreadable selection falls back to A1.
        match obj.get("selection").map(|v| serde_json::from_value::<Vec<CellRange>>(v.clone())) {
            Some(Ok(ranges)) if !ranges.is_empty() => sheet.selection = Selection::from_ranges(ranges),
            Some(Err(e)) => log::debug!("sheet '{}' selection ignored: {}", id, e),
            _ => {}
        }
        Ok(sheet)
    }
}

/// Scroll source for a [`MemoryHost`]. Clones share the mounted flag.
#[derive(Debug, Clone, Default)]
pub struct MemoryViewport {
    mounted: Rc<Cell<bool>>,
    hub: EventHub,
}

impl ViewportProvider for MemoryViewport {
    fn attach(&mut self) -> Option<Subscription> {
        self.mounted.get().then(|| self.hub.subscribe(Topic::Scroll))
    }
}

#[derive(Debug, Clone)]
struct UndoEntry {
    forward: Mutation,
    inverse: Mutation,
}

#[derive(Debug)]
pub struct MemoryHost {
    unit_id: String,
    name: String,
    locale: String,
    app_version: String,
    styles: Value,
    sheets: Vec<MemorySheet>,
    active: Option<usize>,
    hub: EventHub,
    viewport: MemoryViewport,
    executed: Vec<(Mutation, History)>,
    undo_stack: Vec<UndoEntry>,
    redo_stack: Vec<UndoEntry>,
    rejected: HashSet<MutationKind>,
}

impl MemoryHost {
    /// Document with no sheets.
    pub fn empty(unit_id: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            name: String::new(),
            locale: gridext_config::settings::DEFAULT_LOCALE.to_string(),
            app_version: gridext_core::snapshot::SNAPSHOT_APP_VERSION.to_string(),
            styles: Value::Object(Map::new()),
            sheets: Vec::new(),
            active: None,
            hub: EventHub::new(),
            viewport: MemoryViewport::default(),
            executed: Vec::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            rejected: HashSet::new(),
        }
    }

    /// Document with a single active sheet of the given size.
    pub fn new(unit_id: impl Into<String>, row_count: usize, column_count: usize) -> Self {
        let mut host = Self::empty(unit_id);
        host.add_sheet("sheet-01", "Sheet1", GridBounds::new(row_count, column_count));
        host
    }

    pub fn from_snapshot(snapshot: Value) -> Result<Self, HostError> {
        let mut host = Self::empty("");
        host.replace_document(snapshot)?;
        Ok(host)
    }

    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a sheet; the first sheet added becomes active.
    pub fn add_sheet(&mut self, id: impl Into<String>, name: impl Into<String>, bounds: GridBounds) -> SheetRef {
        let sheet = MemorySheet::new(id, name, bounds);
        let sheet_ref = SheetRef::new(self.unit_id.clone(), sheet.id.clone());
        self.sheets.push(sheet);
        if self.active.is_none() {
            self.active = Some(0);
        }
        sheet_ref
    }

    pub fn set_active_sheet(&mut self, sheet_id: &str) -> Result<(), HostError> {
        let idx = self
            .sheets
            .iter()
            .position(|s| s.id == sheet_id)
            .ok_or_else(|| HostError::UnknownSheet(sheet_id.to_string()))?;
        self.active = Some(idx);
        Ok(())
    }

    pub fn sheet_ids(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.id.clone()).collect()
    }

    /// Move the active sheet's selection and notify listeners.
    pub fn select(&mut self, range: CellRange) {
        let Some(idx) = self.active else { return };
        let sheet = &mut self.sheets[idx];
        sheet.selection = Selection::from_ranges(vec![range]);
        let event = SelectionChangedEvent {
            sheet: SheetRef::new(self.unit_id.clone(), sheet.id.clone()),
            selection: sheet.selection.clone(),
        };
        self.hub.broadcast(HostEvent::SelectionChanged(event));
    }

    /// Write a cell directly, bypassing the mutation bus.
    pub fn set_cell(&mut self, row: usize, col: usize, cell: CellData) {
        if let Some(idx) = self.active {
            self.sheets[idx].cells.set(row, col, cell);
        }
    }

    pub fn cells(&self, sheet: &SheetRef) -> Option<&CellValueMap> {
        self.sheet_index(sheet).map(|idx| &self.sheets[idx].cells)
    }

    /// Every mutation executed so far, in order.
    pub fn executed(&self) -> &[(Mutation, History)] {
        &self.executed
    }

    /// Refuse every future mutation of `kind`.
    pub fn reject(&mut self, kind: MutationKind) {
        self.rejected.insert(kind);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Revert the last tracked mutation. Returns false when there is none.
    pub fn undo(&mut self) -> Result<bool, HostError> {
        let Some(entry) = self.undo_stack.pop() else {
            return Ok(false);
        };
        self.apply(&entry.inverse)?;
        self.redo_stack.push(entry);
        Ok(true)
    }

    pub fn redo(&mut self) -> Result<bool, HostError> {
        let Some(entry) = self.redo_stack.pop() else {
            return Ok(false);
        };
        self.apply(&entry.forward)?;
        self.undo_stack.push(entry);
        Ok(true)
    }

    /// Handle to hand to a controller as its viewport provider.
    pub fn viewport(&self) -> MemoryViewport {
        self.viewport.clone()
    }

    pub fn mount_viewport(&mut self) {
        self.viewport.mounted.set(true);
    }

    pub fn scroll(&mut self, metrics: ScrollMetrics) {
        self.viewport.hub.broadcast(HostEvent::Scrolled(metrics));
    }

    /// Live listeners across the host bus and the viewport.
    pub fn listener_count(&self) -> usize {
        self.hub.listener_count() + self.viewport.hub.listener_count()
    }

    fn sheet_index(&self, sheet: &SheetRef) -> Option<usize> {
        if sheet.unit_id != self.unit_id {
            return None;
        }
        self.sheets.iter().position(|s| s.id == sheet.sheet_id)
    }

    fn apply(&mut self, mutation: &Mutation) -> Result<(), HostError> {
        let kind = mutation.kind();
        if self.rejected.contains(&kind) {
            return Err(HostError::Rejected(kind.to_string(), "refused by host".into()));
        }
        let idx = self
            .sheet_index(mutation.sheet())
            .ok_or_else(|| HostError::UnknownSheet(mutation.sheet().sheet_id.clone()))?;
        self.sheets[idx].apply(mutation);
        self.hub.broadcast(HostEvent::MutationExecuted(MutationExecutedEvent {
            mutation: mutation.clone(),
        }));
        Ok(())
    }
}

impl HostGridFacade for MemoryHost {
    fn active_sheet(&self) -> Option<SheetRef> {
        let sheet = &self.sheets[self.active?];
        Some(SheetRef::new(self.unit_id.clone(), sheet.id.clone()))
    }

    fn bounds(&self, sheet: &SheetRef) -> Option<GridBounds> {
        self.sheet_index(sheet).map(|idx| self.sheets[idx].bounds)
    }

    fn selection(&self, sheet: &SheetRef) -> Option<Selection> {
        self.sheet_index(sheet).map(|idx| self.sheets[idx].selection.clone())
    }

    fn cell(&self, sheet: &SheetRef, row: usize, col: usize) -> Option<CellData> {
        let idx = self.sheet_index(sheet)?;
        self.sheets[idx].cells.get(row, col).cloned()
    }

    fn execute(&mut self, mutation: Mutation, history: History) -> Result<(), HostError> {
        self.apply(&mutation)?;
        if let History::Tracked { undo } = &history {
            self.undo_stack.push(UndoEntry { forward: mutation.clone(), inverse: undo.clone() });
            self.redo_stack.clear();
        }
        self.executed.push((mutation, history));
        Ok(())
    }

    fn subscribe(&mut self, topic: Topic) -> Subscription {
        log::debug!("listener added for {} events", topic.as_str());
        match topic {
            Topic::Scroll => self.viewport.hub.subscribe(topic),
            _ => self.hub.subscribe(topic),
        }
    }

    fn export_snapshot(&self) -> Option<Value> {
        if self.sheets.is_empty() {
            return None;
        }
        let mut sheets = Map::new();
        for sheet in &self.sheets {
            sheets.insert(sheet.id.clone(), sheet.to_json());
        }
        Some(json!({
            "id": self.unit_id,
            "name": self.name,
            "appVersion": self.app_version,
            "locale": self.locale,
            "styles": self.styles,
            "sheetOrder": self.sheet_ids(),
            "sheets": sheets,
        }))
    }

    fn replace_document(&mut self, snapshot: Value) -> Result<(), HostError> {
        let obj = snapshot
            .as_object()
            .ok_or_else(|| HostError::InvalidSnapshot("snapshot is not an object".into()))?;
        let sheet_map = obj
            .get("sheets")
            .and_then(Value::as_object)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| HostError::InvalidSnapshot("snapshot has no sheets".into()))?;

        let mut order: Vec<&str> = obj
            .get("sheetOrder")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .filter(|id| sheet_map.contains_key(*id))
                    .collect()
            })
            .unwrap_or_default();
        for id in sheet_map.keys() {
            if !order.contains(&id.as_str()) {
                order.push(id.as_str());
            }
        }

        // Parse everything before touching state.
        let sheets = order
            .iter()
            .map(|id| MemorySheet::from_json(id, &sheet_map[*id]))
            .collect::<Result<Vec<_>, _>>()?;

        let text = |key: &str| obj.get(key).and_then(Value::as_str).map(String::from);
        if let Some(id) = text("id") {
            self.unit_id = id;
        }
        self.name = text("name").unwrap_or_default();
        if let Some(locale) = text("locale") {
            self.locale = locale;
        }
        if let Some(version) = text("appVersion") {
            self.app_version = version;
        }
        self.styles = obj.get("styles").cloned().unwrap_or_else(|| Value::Object(Map::new()));
        self.sheets = sheets;
        self.active = Some(0);
        self.undo_stack.clear();
        self.redo_stack.clear();
        log::info!("document '{}' loaded with {} sheet(s)", self.unit_id, self.sheets.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(host: &mut MemoryHost, row: usize, col: usize, text: &str) {
        let sheet = host.active_sheet().unwrap();
        let mut cells = CellValueMap::new();
        cells.set(row, col, CellData::text(text));
        let mut inverse = CellValueMap::new();
        inverse.set(row, col, host.cell(&sheet, row, col).unwrap_or_default());
        let undo = Mutation::SetRangeValues { sheet: sheet.clone(), cells: inverse };
        host.execute(Mutation::SetRangeValues { sheet, cells }, History::Tracked { undo }).unwrap();
    }

    #[test]
    fn test_tracked_write_undo_redo() {
        let mut host = MemoryHost::new("book", 10, 10);
        let sheet = host.active_sheet().unwrap();
        write(&mut host, 1, 1, "a");
        write(&mut host, 1, 1, "b");

        assert_eq!(host.cell(&sheet, 1, 1).unwrap().display(), "b");
        assert!(host.undo().unwrap());
        assert_eq!(host.cell(&sheet, 1, 1).unwrap().display(), "a");
        assert!(host.undo().unwrap());
        assert!(host.cell(&sheet, 1, 1).is_none());
        assert!(!host.undo().unwrap());

        assert!(host.can_redo());
        assert!(host.redo().unwrap());
        assert_eq!(host.cell(&sheet, 1, 1).unwrap().display(), "a");
        assert!(host.can_redo());
    }

    #[test]
    fn test_untracked_mutations_skip_undo() {
        let mut host = MemoryHost::new("book", 10, 10);
        let sheet = host.active_sheet().unwrap();
        host.execute(Mutation::SetRowCount { sheet: sheet.clone(), row_count: 50 }, History::Untracked)
            .unwrap();
        assert_eq!(host.bounds(&sheet).unwrap().row_count, 50);
        assert!(!host.can_undo());
    }

    #[test]
    fn test_write_past_edge_grows_bounds() {
        let mut host = MemoryHost::new("book", 5, 5);
        write(&mut host, 7, 6, "x");
        let sheet = host.active_sheet().unwrap();
        assert_eq!(host.bounds(&sheet).unwrap(), GridBounds::new(8, 7));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut host = MemoryHost::new("book", 30, 4);
        host.add_sheet("sheet-02", "Data", GridBounds::new(5, 5));
        write(&mut host, 0, 0, "hello");

        let snapshot = host.export_snapshot().unwrap();
        assert_eq!(snapshot["sheetOrder"], json!(["sheet-01", "sheet-02"]));
        assert_eq!(snapshot["sheets"]["sheet-01"]["cellData"]["0"]["0"]["v"], "hello");

        let copy = MemoryHost::from_snapshot(snapshot.clone()).unwrap();
        assert_eq!(copy.export_snapshot().unwrap(), snapshot);
    }

    #[test]
    fn test_selection_survives_snapshot() {
        let mut host = MemoryHost::new("book", 30, 4);
        host.select(CellRange::single(6, 1));

        let copy = MemoryHost::from_snapshot(host.export_snapshot().unwrap()).unwrap();
        let sheet = copy.active_sheet().unwrap();
        assert_eq!(copy.selection(&sheet).unwrap().active_cell(), Some((6, 1)));

        let bare = MemoryHost::from_snapshot(json!({"sheets": {"s": {"selection": "B2"}}})).unwrap();
        let sheet = bare.active_sheet().unwrap();
        assert_eq!(bare.selection(&sheet).unwrap().active_cell(), Some((0, 0)));
    }

    #[test]
    fn test_replace_document_honors_sheet_order() {
        let mut host = MemoryHost::new("old", 10, 10);
        host.replace_document(json!({
            "id": "new",
            "sheetOrder": ["b", "a"],
            "sheets": {"a": {"name": "A"}, "b": {"name": "B", "rowCount": 7}}
        }))
        .unwrap();

        let active = host.active_sheet().unwrap();
        assert_eq!(active, SheetRef::new("new", "b"));
        assert_eq!(host.bounds(&active).unwrap(), GridBounds::new(7, DEFAULT_COLUMN_COUNT));
        assert_eq!(host.sheet_ids(), vec!["b", "a"]);
    }

    #[test]
    fn test_invalid_snapshot_leaves_document_untouched() {
        let mut host = MemoryHost::new("book", 10, 10);
        assert!(matches!(host.replace_document(json!([1, 2])), Err(HostError::InvalidSnapshot(_))));
        assert!(matches!(host.replace_document(json!({"sheets": {}})), Err(HostError::InvalidSnapshot(_))));
        assert!(matches!(
            host.replace_document(json!({"sheets": {"s": {"cellData": "bad"}}})),
            Err(HostError::InvalidSnapshot(_))
        ));
        assert_eq!(host.unit_id(), "book");
        assert_eq!(host.sheet_ids(), vec!["sheet-01"]);
    }

    #[test]
    fn test_rejected_kind() {
        let mut host = MemoryHost::new("book", 10, 10);
        host.reject(MutationKind::SetColumnCount);
        let sheet = host.active_sheet().unwrap();
        let err = host
            .execute(Mutation::SetColumnCount { sheet, column_count: 20 }, History::Untracked)
            .unwrap_err();
        assert!(matches!(err, HostError::Rejected(_, _)));
        assert!(host.executed().is_empty());
    }

    #[test]
    fn test_selection_broadcast() {
        let mut host = MemoryHost::new("book", 10, 10);
        let sub = host.subscribe(Topic::Selection);
        host.select(CellRange::new(2, 2, 4, 3));
        let events = sub.poll();
        assert_eq!(events.len(), 1);
        let sheet = host.active_sheet().unwrap();
        assert_eq!(host.selection(&sheet).unwrap().end_cell(), Some((4, 3)));
    }
}
