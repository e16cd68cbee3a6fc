//! Expansion decision: a pure function of probe, bounds and config.

use gridext_config::ExpansionConfig;
use gridext_core::{EdgeProbe, GridBounds};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpansionDecision {
    pub expand_rows: bool,
    pub new_row_count: Option<usize>,
    pub expand_columns: bool,
    pub new_column_count: Option<usize>,
}

impl ExpansionDecision {
    pub fn is_noop(&self) -> bool {
        !self.expand_rows && !self.expand_columns
    }
}

/// Decide whether `probe` is close enough to the edge of `bounds` to grow
/// the sheet. A threshold at or above the bounds expands on any probe.
pub fn decide(probe: EdgeProbe, bounds: GridBounds, config: &ExpansionConfig) -> ExpansionDecision {
    let threshold = config.trigger_threshold;
    let mut decision = ExpansionDecision::default();

    if let Some(row) = probe.row {
        if row >= bounds.row_count.saturating_sub(threshold) {
            decision.expand_rows = true;
            decision.new_row_count = Some(bounds.row_count + config.rows_to_add);
        }
    }
    if let Some(column) = probe.column {
        if column >= bounds.column_count.saturating_sub(threshold) {
            decision.expand_columns = true;
            decision.new_column_count = Some(bounds.column_count + config.columns_to_add);
        }
    }

    decision
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ExpansionConfig {
        ExpansionConfig::default()
    }

    #[test]
    fn test_below_threshold_never_expands() {
        let bounds = GridBounds::new(1000, 26);
        for row in [0, 500, 994] {
            for col in [0, 10, 20] {
                assert!(decide(EdgeProbe::at(row, col), bounds, &config()).is_noop());
            }
        }
    }

    #[test]
    fn test_at_threshold_expands_rows() {
        let bounds = GridBounds::new(1000, 26);
        let d = decide(EdgeProbe::at(995, 0), bounds, &config());
        assert!(d.expand_rows);
        assert_eq!(d.new_row_count, Some(1100));
        assert!(!d.expand_columns);
        assert_eq!(d.new_column_count, None);

        // Same inputs, same answer.
        assert_eq!(d, decide(EdgeProbe::at(995, 0), bounds, &config()));
    }

    #[test]
    fn test_both_axes() {
        let d = decide(EdgeProbe::at(999, 25), GridBounds::new(1000, 26), &config());
        assert_eq!(d.new_row_count, Some(1100));
        assert_eq!(d.new_column_count, Some(36));
    }

    #[test]
    fn test_threshold_larger_than_bounds_expands_immediately() {
        let d = decide(EdgeProbe::at(0, 0), GridBounds::new(3, 2), &config());
        assert!(d.expand_rows);
        assert!(d.expand_columns);
    }

    #[test]
    fn test_absent_axis_never_expands() {
        let bounds = GridBounds::new(10, 10);
        let d = decide(EdgeProbe::column_only(9), bounds, &config());
        assert!(!d.expand_rows);
        assert!(d.expand_columns);
        assert!(decide(EdgeProbe::default(), bounds, &config()).is_noop());
    }
}
