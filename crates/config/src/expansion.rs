// Auto-expansion settings

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_ROWS_TO_ADD: usize = 100;
pub const DEFAULT_COLUMNS_TO_ADD: usize = 10;
pub const DEFAULT_TRIGGER_THRESHOLD: usize = 5;

/// Retry policy for attaching to a viewport that mounts after start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewportRetry {
    pub max_attempts: u32,
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
}

impl Default for ViewportRetry {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            initial_interval_ms: 100,
            max_interval_ms: 2_000,
        }
    }
}

impl ViewportRetry {
    /// Delay before attempt number `attempt` (1-based retry count), doubling
    /// from the initial interval and capped at the max interval.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(20);
        let ms = self
            .initial_interval_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_interval_ms.max(self.initial_interval_ms));
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExpansionConfig {
    /// Master switch. When off, no listeners are registered at all.
    pub enabled: bool,
    pub rows_to_add: usize,
    pub columns_to_add: usize,
    /// Distance from the edge (in cells) at which expansion kicks in.
    pub trigger_threshold: usize,
    pub enable_navigation_expansion: bool,
    pub enable_scroll_expansion: bool,
    pub enable_data_fill_expansion: bool,

    /// Quiet period collapsing a scroll burst into one evaluation.
    pub scroll_debounce_ms: u64,
    /// Cooldown after an expansion before the next one is accepted.
    pub settle_delay_ms: u64,
    /// How close (in pixels) the viewport must be to an edge to probe it.
    pub scroll_edge_margin_px: f64,
    pub viewport_retry: ViewportRetry,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rows_to_add: DEFAULT_ROWS_TO_ADD,
            columns_to_add: DEFAULT_COLUMNS_TO_ADD,
            trigger_threshold: DEFAULT_TRIGGER_THRESHOLD,
            enable_navigation_expansion: true,
            enable_scroll_expansion: true,
            enable_data_fill_expansion: true,
            scroll_debounce_ms: 200,
            settle_delay_ms: 100,
            scroll_edge_margin_px: 100.0,
            viewport_retry: ViewportRetry::default(),
        }
    }
}

impl ExpansionConfig {
    /// Merge a partial config over the defaults (never over a previous value).
    pub fn from_partial(partial: &PartialExpansionConfig) -> Self {
        let d = Self::default();
        let mut config = Self {
            enabled: partial.enabled.unwrap_or(d.enabled),
            rows_to_add: partial.rows_to_add.unwrap_or(d.rows_to_add),
            columns_to_add: partial.columns_to_add.unwrap_or(d.columns_to_add),
            trigger_threshold: partial.trigger_threshold.unwrap_or(d.trigger_threshold),
            enable_navigation_expansion: partial
                .enable_navigation_expansion
                .unwrap_or(d.enable_navigation_expansion),
            enable_scroll_expansion: partial.enable_scroll_expansion.unwrap_or(d.enable_scroll_expansion),
            enable_data_fill_expansion: partial
                .enable_data_fill_expansion
                .unwrap_or(d.enable_data_fill_expansion),
            scroll_debounce_ms: partial.scroll_debounce_ms.unwrap_or(d.scroll_debounce_ms),
            settle_delay_ms: partial.settle_delay_ms.unwrap_or(d.settle_delay_ms),
            scroll_edge_margin_px: partial.scroll_edge_margin_px.unwrap_or(d.scroll_edge_margin_px),
            viewport_retry: partial.viewport_retry.unwrap_or(d.viewport_retry),
        };
        config.normalize();
        config
    }

    /// Replace zero increments and negative margins with defaults.
    pub fn normalize(&mut self) {
        if self.rows_to_add == 0 {
            log::warn!("expansion.rowsToAdd must be > 0, using {}", DEFAULT_ROWS_TO_ADD);
            self.rows_to_add = DEFAULT_ROWS_TO_ADD;
        }
        if self.columns_to_add == 0 {
            log::warn!("expansion.columnsToAdd must be > 0, using {}", DEFAULT_COLUMNS_TO_ADD);
            self.columns_to_add = DEFAULT_COLUMNS_TO_ADD;
        }
        if !self.scroll_edge_margin_px.is_finite() || self.scroll_edge_margin_px < 0.0 {
            self.scroll_edge_margin_px = Self::default().scroll_edge_margin_px;
        }
    }

    /// True if at least one event source would be registered.
    pub fn any_source_enabled(&self) -> bool {
        self.enabled
            && (self.enable_navigation_expansion
                || self.enable_scroll_expansion
                || self.enable_data_fill_expansion)
    }

    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// User-supplied expansion settings; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PartialExpansionConfig {
    pub enabled: Option<bool>,
    pub rows_to_add: Option<usize>,
    pub columns_to_add: Option<usize>,
    pub trigger_threshold: Option<usize>,
    pub enable_navigation_expansion: Option<bool>,
    pub enable_scroll_expansion: Option<bool>,
    pub enable_data_fill_expansion: Option<bool>,
    pub scroll_debounce_ms: Option<u64>,
    pub settle_delay_ms: Option<u64>,
    pub scroll_edge_margin_px: Option<f64>,
    pub viewport_retry: Option<ViewportRetry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_merges_over_defaults() {
        let partial = PartialExpansionConfig {
            rows_to_add: Some(50),
            enable_scroll_expansion: Some(false),
            ..Default::default()
        };
        let config = ExpansionConfig::from_partial(&partial);

        assert_eq!(config.rows_to_add, 50);
        assert!(!config.enable_scroll_expansion);
        assert_eq!(config.columns_to_add, DEFAULT_COLUMNS_TO_ADD);
        assert_eq!(config.trigger_threshold, DEFAULT_TRIGGER_THRESHOLD);
        assert!(config.enabled);
    }

    #[test]
    fn test_zero_increments_fall_back() {
        let partial = PartialExpansionConfig {
            rows_to_add: Some(0),
            columns_to_add: Some(0),
            trigger_threshold: Some(0),
            ..Default::default()
        };
        let config = ExpansionConfig::from_partial(&partial);
        assert_eq!(config.rows_to_add, DEFAULT_ROWS_TO_ADD);
        assert_eq!(config.columns_to_add, DEFAULT_COLUMNS_TO_ADD);
        // A zero threshold is legal.
        assert_eq!(config.trigger_threshold, 0);
    }

    #[test]
    fn test_partial_from_json() {
        let partial: PartialExpansionConfig =
            serde_json::from_str(r#"{"triggerThreshold": 2, "enabled": false}"#).unwrap();
        let config = ExpansionConfig::from_partial(&partial);
        assert_eq!(config.trigger_threshold, 2);
        assert!(!config.enabled);
        assert!(!config.any_source_enabled());
    }

    #[test]
    fn test_retry_backoff_doubles_and_caps() {
        let retry = ViewportRetry { max_attempts: 10, initial_interval_ms: 100, max_interval_ms: 500 };
        assert_eq!(retry.delay_for(1), Duration::from_millis(100));
        assert_eq!(retry.delay_for(2), Duration::from_millis(200));
        assert_eq!(retry.delay_for(3), Duration::from_millis(400));
        assert_eq!(retry.delay_for(4), Duration::from_millis(500));
        assert_eq!(retry.delay_for(40), Duration::from_millis(500));
    }
}
