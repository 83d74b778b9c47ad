//! Text search and feature filters over an enriched snapshot.
//!
//! # Invariants
//! - Text matching is a case-insensitive substring test on title or content.
//! - Every filter must hold (conjunction); filters on unknown or role-less
//!   features are vacuously satisfied.
//! - Results keep snapshot insertion order; nothing is cached between calls.

use crate::enrich::snapshot::{EnrichedNote, EnrichedSnapshot};
use crate::feature::registry::FeatureRegistry;
use crate::model::value::AttributeValue;
use std::collections::BTreeMap;

/// Search input: free text plus `feature id -> expected value` filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub text: String,
    pub filters: BTreeMap<String, AttributeValue>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filters: BTreeMap::new(),
        }
    }

    /// Adds one exact-equality filter on a feature's attribute.
    pub fn with_filter(mut self, feature_id: impl Into<String>, expected: AttributeValue) -> Self {
        self.filters.insert(feature_id.into(), expected);
        self
    }

    /// Whether the query constrains anything at all.
    pub fn is_active(&self) -> bool {
        !self.text.trim().is_empty() || !self.filters.is_empty()
    }
}

/// Returns the enriched notes of `snapshot` matching `query`.
pub fn search<'s>(
    snapshot: &'s EnrichedSnapshot,
    registry: &FeatureRegistry,
    query: &SearchQuery,
) -> Vec<&'s EnrichedNote> {
    let needle = query.text.to_lowercase();
    let filters: Vec<(&str, &AttributeValue)> = query
        .filters
        .iter()
        .filter_map(|(feature_id, expected)| {
            registry
                .attribute_role(feature_id)
                .map(|role| (role, expected))
        })
        .collect();

    snapshot
        .iter()
        .filter(|enriched| matches_text(enriched, &needle))
        .filter(|enriched| {
            filters
                .iter()
                .all(|(role, expected)| enriched.attribute(role) == Some(*expected))
        })
        .collect()
}

fn matches_text(enriched: &EnrichedNote, needle: &str) -> bool {
    needle.is_empty()
        || enriched.note.title.to_lowercase().contains(needle)
        || enriched.note.content.to_lowercase().contains(needle)
}
