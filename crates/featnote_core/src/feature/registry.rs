//! Feature registry: injected catalog of feature definitions.
//!
//! # Invariants
//! - Feature ids are unique; re-registration overwrites in place.
//! - Iteration order is insertion order of the first registration.
//! - Lookups never fail; unknown ids resolve to `None` or are filtered out.

use crate::feature::builtin;
use crate::feature::definition::{FeatureCategory, FeatureDefinition};
use log::{debug, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// In-process feature catalog.
///
/// Mutation needs `&mut self`; populate once at startup, then share it
/// read-only (typically behind an `Arc`).
#[derive(Debug, Default)]
pub struct FeatureRegistry {
    entries: Vec<FeatureDefinition>,
    index: HashMap<String, usize>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with the built-in catalog.
    pub fn with_builtin_features() -> Self {
        let mut registry = Self::new();
        for definition in builtin::builtin_features() {
            let feature_id = definition.id.clone();
            if let Err(err) = registry.register(definition) {
                warn!(
                    "event=feature_register module=feature status=skip feature_id={} error={}",
                    feature_id, err
                );
            }
        }
        registry
    }

    /// Inserts or overwrites one definition by id.
    pub fn register(&mut self, definition: FeatureDefinition) -> Result<(), FeatureRegistryError> {
        if definition.id.trim().is_empty() {
            warn!("event=feature_register module=feature status=error error_code=empty_id");
            return Err(FeatureRegistryError::EmptyId);
        }

        match self.index.get(definition.id.as_str()) {
            Some(&position) => {
                debug!(
                    "event=feature_register module=feature status=ok mode=overwrite feature_id={}",
                    definition.id
                );
                self.entries[position] = definition;
            }
            None => {
                debug!(
                    "event=feature_register module=feature status=ok mode=insert feature_id={} kind={}",
                    definition.id,
                    definition.kind.as_str()
                );
                self.index.insert(definition.id.clone(), self.entries.len());
                self.entries.push(definition);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, feature_id: &str) -> Option<&FeatureDefinition> {
        self.index
            .get(feature_id)
            .and_then(|&position| self.entries.get(position))
    }

    /// Returns all definitions in insertion order.
    pub fn get_all(&self) -> Vec<&FeatureDefinition> {
        self.entries.iter().collect()
    }

    pub fn get_by_category(&self, category: FeatureCategory) -> Vec<&FeatureDefinition> {
        self.entries
            .iter()
            .filter(|definition| definition.category == category)
            .collect()
    }

    /// Resolves enabled ids, preserving input order and dropping unknown ids.
    pub fn get_enabled<S: AsRef<str>>(&self, enabled_ids: &[S]) -> Vec<&FeatureDefinition> {
        enabled_ids
            .iter()
            .filter_map(|id| self.get(id.as_ref()))
            .collect()
    }

    /// Attribute role of one feature, if it is registered and has one.
    pub fn attribute_role(&self, feature_id: &str) -> Option<&str> {
        self.get(feature_id)
            .and_then(|definition| definition.attribute_role.as_deref())
    }
}

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureRegistryError {
    EmptyId,
}

impl Display for FeatureRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "feature id must not be empty"),
        }
    }
}

impl Error for FeatureRegistryError {}
