//! Mutations issued to the host's mutation bus.

use crate::bounds::SheetRef;
use crate::cells::CellValueMap;

/// A single host mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Write a sparse batch of cells.
    SetRangeValues {
        sheet: SheetRef,
        cells: CellValueMap,
    },
    /// Set the sheet's row count.
    SetRowCount {
        sheet: SheetRef,
        row_count: usize,
    },
    /// Set the sheet's column count.
    SetColumnCount {
        sheet: SheetRef,
        column_count: usize,
    },
}

impl Mutation {
    /// Stable identifier, used for logging and event filtering.
    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::SetRangeValues { .. } => MutationKind::SetRangeValues,
            Mutation::SetRowCount { .. } => MutationKind::SetRowCount,
            Mutation::SetColumnCount { .. } => MutationKind::SetColumnCount,
        }
    }

    pub fn sheet(&self) -> &SheetRef {
        match self {
            Mutation::SetRangeValues { sheet, .. }
            | Mutation::SetRowCount { sheet, .. }
            | Mutation::SetColumnCount { sheet, .. } => sheet,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    SetRangeValues,
    SetRowCount,
    SetColumnCount,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::SetRangeValues => "sheet.mutation.set-range-values",
            MutationKind::SetRowCount => "sheet.mutation.set-worksheet-row-count",
            MutationKind::SetColumnCount => "sheet.mutation.set-worksheet-column-count",
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a mutation gets an undo entry.
#[derive(Debug, Clone, PartialEq)]
pub enum History {
    /// Structural adjustment: applied without an undo entry.
    Untracked,
    /// User edit: recorded together with the mutation that reverts it.
    Tracked { undo: Mutation },
}

impl History {
    pub fn is_tracked(&self) -> bool {
        matches!(self, History::Tracked { .. })
    }
}
