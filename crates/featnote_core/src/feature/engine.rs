//! Enrichment engine: per-note attribute computation.
//!
//! # Responsibility
//! - Run enabled computed/rollup features for each note.
//! - Overlay stored properties on computed values.
//!
//! # Invariants
//! - A failing feature is logged and omitted; the remaining attributes and the
//!   note itself are always produced.
//! - Stored properties win over computed values sharing an attribute role.
//! - Output order equals input note order.

use crate::feature::context::ComputeContext;
use crate::feature::definition::FeatureDefinition;
use crate::feature::registry::FeatureRegistry;
use crate::model::note::{Note, NoteId};
use crate::model::value::AttributeMap;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One feature computation failure for one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureComputationError {
    pub feature_id: String,
    pub note_id: NoteId,
    pub message: String,
}

impl Display for FeatureComputationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "feature `{}` failed for note {}: {}",
            self.feature_id, self.note_id, self.message
        )
    }
}

impl Error for FeatureComputationError {}

/// Attributes computed for one note plus the isolated failures.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteAttributes {
    pub note_id: NoteId,
    pub attributes: AttributeMap,
    pub failures: Vec<FeatureComputationError>,
}

/// Engine bound to one resolved, ordered set of enabled features.
#[derive(Debug)]
pub struct FeatureEngine<'r> {
    enabled: Vec<&'r FeatureDefinition>,
}

impl<'r> FeatureEngine<'r> {
    /// Resolves `enabled_ids` against `registry`; unknown ids are ignored.
    pub fn new<S: AsRef<str>>(registry: &'r FeatureRegistry, enabled_ids: &[S]) -> Self {
        Self {
            enabled: registry.get_enabled(enabled_ids),
        }
    }

    /// Builds an engine from already resolved definitions.
    pub fn from_definitions(enabled: Vec<&'r FeatureDefinition>) -> Self {
        Self { enabled }
    }

    pub fn enabled(&self) -> &[&'r FeatureDefinition] {
        &self.enabled
    }

    /// Computes the attribute mapping of one note.
    ///
    /// Failures are logged and dropped; use [`Self::compute_note_attributes`]
    /// to inspect them.
    pub fn compute_for_note(&self, note: &Note, context: &ComputeContext) -> AttributeMap {
        self.compute_note_attributes(note, context).attributes
    }

    /// Computes one note and reports isolated feature failures.
    pub fn compute_note_attributes(&self, note: &Note, context: &ComputeContext) -> NoteAttributes {
        let mut attributes = AttributeMap::new();
        let mut failures = Vec::new();

        for definition in &self.enabled {
            let Some(compute) = definition.compute else {
                continue;
            };

            match compute(note, context) {
                Ok(value) => {
                    if let Some(role) = definition.attribute_role.as_ref() {
                        attributes.insert(role.clone(), value);
                    }
                }
                Err(message) => {
                    warn!(
                        "event=feature_compute module=engine status=error feature_id={} note_id={} error={}",
                        definition.id, note.id, message
                    );
                    failures.push(FeatureComputationError {
                        feature_id: definition.id.clone(),
                        note_id: note.id.clone(),
                        message,
                    });
                }
            }
        }

        for property in context.properties_for(&note.id) {
            let role = self
                .enabled
                .iter()
                .find(|definition| definition.id == property.feature_id)
                .and_then(|definition| definition.attribute_role.as_ref());
            if let Some(role) = role {
                attributes.insert(role.clone(), property.value.clone());
            }
        }

        NoteAttributes {
            note_id: note.id.clone(),
            attributes,
            failures,
        }
    }

    /// Computes every note independently, preserving input order.
    pub fn compute_for_all_notes(
        &self,
        notes: &[Note],
        context: &ComputeContext,
    ) -> Vec<NoteAttributes> {
        notes
            .iter()
            .map(|note| self.compute_note_attributes(note, context))
            .collect()
    }
}
