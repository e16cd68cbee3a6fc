//! Data insertion flow.
//!
//! `SourceSelected -> DataFetched -> FieldsSelected -> ModeChosen ->
//! Confirmed | Cancelled`. Nothing touches the grid until `confirm`, which
//! issues a single undo-tracked range write.

use std::fmt;

use gridext_core::{display_string, CellData, CellRange, CellValueMap, History, Mutation};
use gridext_gateway::RemoteGateway;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::host::{HostError, HostGridFacade};

/// Field name used for items that are not objects.
pub const SCALAR_FIELD: &str = "value";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertMode {
    /// Header row, one row per item.
    #[default]
    Row,
    /// Header column, one column per item.
    Column,
}

impl std::str::FromStr for InsertMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "row" | "rows" => Ok(InsertMode::Row),
            "column" | "columns" | "col" => Ok(InsertMode::Column),
            other => Err(format!("unknown insert mode '{}' (expected row or column)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    SourceSelected,
    DataFetched,
    FieldsSelected,
    ModeChosen,
    Confirmed,
    Cancelled,
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlowStage::SourceSelected => "source selected",
            FlowStage::DataFetched => "data fetched",
            FlowStage::FieldsSelected => "fields selected",
            FlowStage::ModeChosen => "mode chosen",
            FlowStage::Confirmed => "confirmed",
            FlowStage::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("cannot {action} while {stage}")]
    OutOfOrder { action: &'static str, stage: FlowStage },
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("no fields selected")]
    NoFields,
    #[error(transparent)]
    Host(#[from] HostError),
}

/// What a confirmed insertion wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOutcome {
    pub range: CellRange,
    pub cells_written: usize,
}

#[derive(Debug, Clone)]
pub struct InsertFlow {
    stage: FlowStage,
    source_id: String,
    items: Vec<Value>,
    available: Vec<String>,
    selected: Vec<String>,
    mode: InsertMode,
}

impl InsertFlow {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            stage: FlowStage::SourceSelected,
            source_id: source_id.into(),
            items: Vec::new(),
            available: Vec::new(),
            selected: Vec::new(),
            mode: InsertMode::Row,
        }
    }

    pub fn stage(&self) -> FlowStage {
        self.stage
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Fields of the first item, in declaration order.
    pub fn available_fields(&self) -> &[String] {
        &self.available
    }

    pub fn selected_fields(&self) -> &[String] {
        &self.selected
    }

    pub fn mode(&self) -> InsertMode {
        self.mode
    }

    fn expect_stage(&self, action: &'static str, allowed: &[FlowStage]) -> Result<(), FlowError> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(FlowError::OutOfOrder { action, stage: self.stage })
        }
    }

    /// Fetch the source through the gateway. Failures yield an empty preview.
    pub fn fetch(&mut self, gateway: &RemoteGateway) -> Result<&[Value], FlowError> {
        self.expect_stage("fetch", &[FlowStage::SourceSelected])?;
        let items = gateway.fetch_dropdown(&self.source_id);
        self.accept_items(items)
    }

    /// Supply items fetched elsewhere (e.g. off the UI loop).
    pub fn accept_items(&mut self, items: Vec<Value>) -> Result<&[Value], FlowError> {
        self.expect_stage("accept data", &[FlowStage::SourceSelected])?;
        self.available = items.first().map(field_names).unwrap_or_default();
        self.selected = self.available.clone();
        self.items = items;
        self.stage = FlowStage::DataFetched;
        log::debug!("source '{}' returned {} item(s)", self.source_id, self.items.len());
        Ok(&self.items)
    }

    /// Turn a field off, or back on at the end of the selection.
    pub fn toggle_field(&mut self, field: &str) -> Result<bool, FlowError> {
        self.expect_stage("select fields", &[FlowStage::DataFetched, FlowStage::FieldsSelected])?;
        if !self.available.iter().any(|f| f == field) {
            return Err(FlowError::UnknownField(field.to_string()));
        }
        let enabled = match self.selected.iter().position(|f| f == field) {
            Some(idx) => {
                self.selected.remove(idx);
                false
            }
            None => {
                self.selected.push(field.to_string());
                true
            }
        };
        self.stage = FlowStage::FieldsSelected;
        Ok(enabled)
    }

    /// Replace the selection with `fields`, in the given order.
    pub fn select_fields<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<(), FlowError> {
        self.expect_stage("select fields", &[FlowStage::DataFetched, FlowStage::FieldsSelected])?;
        let mut selected = Vec::with_capacity(fields.len());
        for field in fields {
            let field = field.as_ref();
            if !self.available.iter().any(|f| f == field) {
                return Err(FlowError::UnknownField(field.to_string()));
            }
            if !selected.iter().any(|f: &String| f == field) {
                selected.push(field.to_string());
            }
        }
        self.selected = selected;
        self.stage = FlowStage::FieldsSelected;
        Ok(())
    }

    pub fn choose_mode(&mut self, mode: InsertMode) -> Result<(), FlowError> {
        self.expect_stage(
            "choose mode",
            &[FlowStage::DataFetched, FlowStage::FieldsSelected, FlowStage::ModeChosen],
        )?;
        if self.selected.is_empty() {
            return Err(FlowError::NoFields);
        }
        self.mode = mode;
        self.stage = FlowStage::ModeChosen;
        Ok(())
    }

    /// Grid the flow would write, header included.
    pub fn preview(&self) -> Vec<Vec<String>> {
        layout(&self.items, &self.selected, self.mode)
    }

    /// Write the data at the active selection's start cell.
    ///
    /// Returns `None` when the host has no active sheet.
    pub fn confirm(&mut self, host: &mut dyn HostGridFacade) -> Result<Option<InsertOutcome>, FlowError> {
        self.expect_stage("confirm", &[FlowStage::ModeChosen])?;

        let Some(sheet) = host.active_sheet() else {
            log::debug!("no active sheet, insertion skipped");
            self.stage = FlowStage::Confirmed;
            return Ok(None);
        };
        let (row, col) = host
            .selection(&sheet)
            .and_then(|s| s.active_cell())
            .unwrap_or((0, 0));

        let grid = self.preview();
        let cells = CellValueMap::from_grid(row, col, &grid);
        let inverse = inverse_of(host, &sheet, &cells);
        let width = grid.iter().map(Vec::len).max().unwrap_or(0);
        let outcome = InsertOutcome {
            range: CellRange::new(row, col, row + grid.len().saturating_sub(1), col + width.saturating_sub(1)),
            cells_written: cells.len(),
        };

        let undo = Mutation::SetRangeValues { sheet: sheet.clone(), cells: inverse };
        host.execute(Mutation::SetRangeValues { sheet, cells }, History::Tracked { undo })?;
        self.stage = FlowStage::Confirmed;
        log::info!(
            "inserted {} cell(s) from '{}' at R{}C{}",
            outcome.cells_written,
            self.source_id,
            row + 1,
            col + 1
        );
        Ok(Some(outcome))
    }

    /// Abandon the flow. Nothing is written.
    pub fn cancel(&mut self) -> Result<(), FlowError> {
        self.expect_stage(
            "cancel",
            &[
                FlowStage::SourceSelected,
                FlowStage::DataFetched,
                FlowStage::FieldsSelected,
                FlowStage::ModeChosen,
            ],
        )?;
        self.items.clear();
        self.selected.clear();
        self.stage = FlowStage::Cancelled;
        Ok(())
    }
}

fn field_names(item: &Value) -> Vec<String> {
    match item {
        Value::Object(obj) => obj.keys().cloned().collect(),
        _ => vec![SCALAR_FIELD.to_string()],
    }
}

fn field_text(item: &Value, field: &str) -> String {
    match item {
        Value::Object(obj) => obj.get(field).map(display_string).unwrap_or_default(),
        scalar if field == SCALAR_FIELD => display_string(scalar),
        _ => String::new(),
    }
}

/// Lay out items as a grid of display strings.
///
/// `Row`: header row of field names, then one row per item. `Column`: the
/// transpose.
pub fn layout(items: &[Value], fields: &[String], mode: InsertMode) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(items.len() + 1);
    rows.push(fields.to_vec());
    for item in items {
        rows.push(fields.iter().map(|f| field_text(item, f)).collect());
    }

    match mode {
        InsertMode::Row => rows,
        InsertMode::Column => (0..fields.len())
            .map(|c| rows.iter().map(|r| r[c].clone()).collect())
            .collect(),
    }
}

/// Current contents of every cell `cells` is about to overwrite.
fn inverse_of(host: &dyn HostGridFacade, sheet: &gridext_core::SheetRef, cells: &CellValueMap) -> CellValueMap {
    let mut inverse = CellValueMap::new();
    for (row, col, _) in cells.iter() {
        let previous = host.cell(sheet, row, col).unwrap_or_else(CellData::empty);
        inverse.set(row, col, previous);
    }
    inverse
}
