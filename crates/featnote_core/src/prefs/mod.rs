//! Feature preferences: enabled feature ids and per-feature configuration.
//!
//! # Responsibility
//! - Own the ordered enabled-feature list fed into recompute passes.
//! - Collapse bursts of preference writes into one storage write.
//!
//! # Invariants
//! - `enabled_features` holds no duplicates; its order is display order.
//! - Preference writes are best-effort: failures are logged, never raised.

mod writer;

pub use writer::{DebouncedPreferencesWriter, SaveDisposition, DEFAULT_DEBOUNCE};

use crate::feature::builtin::{LAST_EDITED, WORD_COUNT};
use crate::feature::context::UserConfig;
use crate::feature::definition::FeatureDefinition;
use serde::{Deserialize, Serialize};

/// Persisted feature preferences document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeaturePreferences {
    pub enabled_features: Vec<String>,
    /// Feature id -> free-form configuration.
    pub feature_configs: UserConfig,
}

impl Default for FeaturePreferences {
    fn default() -> Self {
        Self {
            enabled_features: vec![WORD_COUNT.to_string(), LAST_EDITED.to_string()],
            feature_configs: UserConfig::new(),
        }
    }
}

impl FeaturePreferences {
    pub fn is_enabled(&self, feature_id: &str) -> bool {
        self.enabled_features.iter().any(|id| id == feature_id)
    }

    /// Appends a feature to the enabled list.
    ///
    /// Stores `config`, or the definition's default configuration when none
    /// is given. Returns `false` when the feature was already enabled.
    pub fn enable(&mut self, definition: &FeatureDefinition, config: Option<serde_json::Value>) -> bool {
        if self.is_enabled(&definition.id) {
            return false;
        }
        self.enabled_features.push(definition.id.clone());

        let config = config.or_else(|| {
            definition
                .default_config
                .as_ref()
                .and_then(|defaults| serde_json::to_value(defaults).ok())
        });
        if let Some(config) = config {
            self.feature_configs.insert(definition.id.clone(), config);
        }
        true
    }

    /// Removes a feature from the enabled list; its configuration is kept.
    pub fn disable(&mut self, feature_id: &str) -> bool {
        let before = self.enabled_features.len();
        self.enabled_features.retain(|id| id != feature_id);
        self.enabled_features.len() != before
    }

    pub fn update_config(&mut self, feature_id: impl Into<String>, config: serde_json::Value) {
        self.feature_configs.insert(feature_id.into(), config);
    }

    /// Moves the ids listed in `order` to the front, in that order.
    ///
    /// Ids that are not enabled are ignored; enabled ids missing from `order`
    /// keep their relative order after the listed ones.
    pub fn reorder<S: AsRef<str>>(&mut self, order: &[S]) {
        let mut reordered: Vec<String> = Vec::with_capacity(self.enabled_features.len());
        for id in order {
            let id = id.as_ref();
            if self.is_enabled(id) && !reordered.iter().any(|seen| seen == id) {
                reordered.push(id.to_string());
            }
        }
        for id in &self.enabled_features {
            if !reordered.contains(id) {
                reordered.push(id.clone());
            }
        }
        self.enabled_features = reordered;
    }
}
