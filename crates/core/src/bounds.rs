use serde::{Deserialize, Serialize};

/// Identifies one worksheet inside one document unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SheetRef {
    pub unit_id: String,
    pub sheet_id: String,
}

impl SheetRef {
    pub fn new(unit_id: impl Into<String>, sheet_id: impl Into<String>) -> Self {
        Self { unit_id: unit_id.into(), sheet_id: sheet_id.into() }
    }
}

/// Current row/column extents of a sheet, as reported by the host.
///
/// The host owns these numbers. Callers read them fresh for every decision
/// and never cache them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub row_count: usize,
    pub column_count: usize,
}

impl GridBounds {
    pub fn new(row_count: usize, column_count: usize) -> Self {
        Self { row_count, column_count }
    }

    /// Index of the last row, or None for an empty sheet.
    pub fn last_row(&self) -> Option<usize> {
        self.row_count.checked_sub(1)
    }

    /// Index of the last column, or None for an empty sheet.
    pub fn last_column(&self) -> Option<usize> {
        self.column_count.checked_sub(1)
    }
}

/// A candidate coordinate at which expansion is evaluated.
///
/// Either axis may be absent: the scroll source only knows about the axis
/// the viewport is close to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeProbe {
    pub row: Option<usize>,
    pub column: Option<usize>,
}

impl EdgeProbe {
    pub fn at(row: usize, column: usize) -> Self {
        Self { row: Some(row), column: Some(column) }
    }

    pub fn row_only(row: usize) -> Self {
        Self { row: Some(row), column: None }
    }

    pub fn column_only(column: usize) -> Self {
        Self { row: None, column: Some(column) }
    }

    pub fn is_empty(&self) -> bool {
        self.row.is_none() && self.column.is_none()
    }
}
