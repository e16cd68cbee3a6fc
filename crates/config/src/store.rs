// Single owner of the active configuration

use std::sync::Arc;

use crate::expansion::{ExpansionConfig, PartialExpansionConfig};
use crate::settings::PluginConfig;
use crate::ConfigError;

/// Holds the active [`PluginConfig`].
///
/// Consumers get an `Arc` snapshot and never see a value change under
/// them. Updates build a new value and swap the reference.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    current: Arc<PluginConfig>,
    generation: u64,
}

impl ConfigStore {
    pub fn new(config: PluginConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { current: Arc::new(config), generation: 0 })
    }

    /// Snapshot of the active config.
    pub fn current(&self) -> Arc<PluginConfig> {
        Arc::clone(&self.current)
    }

    /// Bumped on every successful replacement.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the whole config. Invalid values leave the store untouched.
    pub fn replace(&mut self, mut config: PluginConfig) -> Result<Arc<PluginConfig>, ConfigError> {
        config.expansion.normalize();
        config.validate()?;
        self.current = Arc::new(config);
        self.generation += 1;
        Ok(self.current())
    }

    /// Replace the expansion section with `partial` merged over defaults.
    ///
    /// Fields absent from `partial` revert to their defaults, not to the
    /// previous values.
    pub fn update_expansion(&mut self, partial: &PartialExpansionConfig) -> Arc<PluginConfig> {
        let mut next = (*self.current).clone();
        next.expansion = ExpansionConfig::from_partial(partial);
        self.current = Arc::new(next);
        self.generation += 1;
        self.current()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self { current: Arc::new(PluginConfig::default()), generation: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::DropdownSourceConfig;

    #[test]
    fn test_update_is_full_merge_over_defaults() {
        let mut store = ConfigStore::default();
        store.update_expansion(&PartialExpansionConfig {
            rows_to_add: Some(7),
            trigger_threshold: Some(1),
            ..Default::default()
        });
        let after_first = store.current();
        assert_eq!(after_first.expansion.rows_to_add, 7);

        // Second update omits rowsToAdd: it goes back to the default.
        store.update_expansion(&PartialExpansionConfig {
            trigger_threshold: Some(3),
            ..Default::default()
        });
        let config = store.current();
        assert_eq!(config.expansion.rows_to_add, ExpansionConfig::default().rows_to_add);
        assert_eq!(config.expansion.trigger_threshold, 3);

        // Earlier snapshot is unaffected.
        assert_eq!(after_first.expansion.rows_to_add, 7);
        assert_eq!(store.generation(), 2);
    }

    #[test]
    fn test_invalid_replace_keeps_previous() {
        let mut store = ConfigStore::default();
        let mut bad = PluginConfig::default();
        bad.dropdown_sources = vec![
            DropdownSourceConfig::new("x", "X", "/x"),
            DropdownSourceConfig::new("x", "Y", "/y"),
        ];
        assert!(store.replace(bad).is_err());
        assert!(store.current().dropdown_sources.is_empty());
        assert_eq!(store.generation(), 0);
    }
}
