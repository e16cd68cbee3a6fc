//! Turn host events into edge probes.

use gridext_core::{EdgeProbe, GridBounds, Mutation, Selection};

use crate::events::ScrollMetrics;

/// End cell of the most recent selection range.
pub fn selection_probe(selection: &Selection) -> Option<EdgeProbe> {
    selection.end_cell().map(|(row, col)| EdgeProbe::at(row, col))
}

/// Largest written row and column of a range write. Other mutations,
/// including our own row/column count changes, produce nothing.
pub fn edit_probe(mutation: &Mutation) -> Option<EdgeProbe> {
    match mutation {
        Mutation::SetRangeValues { cells, .. } => {
            let (row, col) = cells.max_extent();
            Some(EdgeProbe::at(row, col))
        }
        _ => None,
    }
}

/// Probe the last row/column when the viewport is within `margin` pixels
/// of the content edge on that axis.
pub fn scroll_probe(metrics: &ScrollMetrics, bounds: GridBounds, margin: f64) -> Option<EdgeProbe> {
    let probe = EdgeProbe {
        row: if metrics.distance_to_bottom() <= margin { bounds.last_row() } else { None },
        column: if metrics.distance_to_right() <= margin { bounds.last_column() } else { None },
    };
    (!probe.is_empty()).then_some(probe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridext_core::{CellData, CellRange, CellValueMap, SheetRef};

    #[test]
    fn test_selection_uses_end_of_last_range() {
        let selection = Selection::from_ranges(vec![
            CellRange::new(0, 0, 3, 3),
            CellRange::new(10, 2, 12, 5),
        ]);
        assert_eq!(selection_probe(&selection), Some(EdgeProbe::at(12, 5)));
        assert_eq!(selection_probe(&Selection::default()), None);
    }

    #[test]
    fn test_sparse_write_probe() {
        let mut cells = CellValueMap::new();
        cells.set(0, 0, CellData::value(1));
        cells.set(0, 2, CellData::value(2));
        cells.set(5, 1, CellData::value(3));
        let m = Mutation::SetRangeValues { sheet: SheetRef::new("u", "s"), cells };
        assert_eq!(edit_probe(&m), Some(EdgeProbe::at(5, 2)));

        let empty = Mutation::SetRangeValues { sheet: SheetRef::new("u", "s"), cells: CellValueMap::new() };
        assert_eq!(edit_probe(&empty), Some(EdgeProbe::at(0, 0)));
    }

    #[test]
    fn test_count_mutations_are_ignored() {
        let m = Mutation::SetRowCount { sheet: SheetRef::new("u", "s"), row_count: 10 };
        assert_eq!(edit_probe(&m), None);
    }

    #[test]
    fn test_scroll_probe_per_axis() {
        let bounds = GridBounds::new(1000, 26);
        let near_bottom = ScrollMetrics {
            scroll_top: 19_950.0,
            scroll_left: 0.0,
            viewport_height: 800.0,
            viewport_width: 1200.0,
            content_height: 20_800.0,
            content_width: 2_600.0,
        };
        assert_eq!(scroll_probe(&near_bottom, bounds, 100.0), Some(EdgeProbe::row_only(999)));

        let near_right = ScrollMetrics { scroll_top: 0.0, scroll_left: 1_350.0, ..near_bottom };
        assert_eq!(scroll_probe(&near_right, bounds, 100.0), Some(EdgeProbe::column_only(25)));

        let middle = ScrollMetrics { scroll_top: 5_000.0, ..near_right };
        let middle = ScrollMetrics { scroll_left: 0.0, ..middle };
        assert_eq!(scroll_probe(&middle, bounds, 100.0), None);
    }
}
