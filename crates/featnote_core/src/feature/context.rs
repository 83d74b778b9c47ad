//! Computation context assembled once per recompute pass.
//!
//! # Responsibility
//! - Bundle every input a feature computation may read.
//! - Capture a single timestamp so time-relative features agree within a pass.
//!
//! # Invariants
//! - Note ids are unique inside one context.
//! - Every retained stored property refers to a note of the context.

use crate::model::note::{now_epoch_ms, Note, NoteId};
use crate::model::property::StoredProperty;
use log::warn;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Per-feature user configuration, keyed by feature id.
pub type UserConfig = BTreeMap<String, serde_json::Value>;

/// Read-only inputs shared by every computation of one pass.
#[derive(Debug, Clone)]
pub struct ComputeContext {
    notes: Vec<Note>,
    properties: Vec<StoredProperty>,
    user_config: UserConfig,
    timestamp: i64,
    properties_by_note: HashMap<NoteId, Vec<usize>>,
}

impl ComputeContext {
    /// Every note of the pass, in input order.
    pub fn all_notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn all_properties(&self) -> &[StoredProperty] {
        &self.properties
    }

    pub fn user_config(&self) -> &UserConfig {
        &self.user_config
    }

    /// Configuration for one feature, if any.
    pub fn feature_config(&self, feature_id: &str) -> Option<&serde_json::Value> {
        self.user_config.get(feature_id)
    }

    /// Pass timestamp in epoch milliseconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Stored properties of one note, in storage order.
    pub fn properties_for<'a>(
        &'a self,
        note_id: &NoteId,
    ) -> impl Iterator<Item = &'a StoredProperty> + 'a {
        self.properties_by_note
            .get(note_id)
            .into_iter()
            .flatten()
            .filter_map(move |&position| self.properties.get(position))
    }

    /// Consumes the context and returns its notes.
    pub fn into_notes(self) -> Vec<Note> {
        self.notes
    }
}

/// Builder for [`ComputeContext`].
#[derive(Debug, Clone, Default)]
pub struct ComputeContextBuilder {
    notes: Vec<Note>,
    properties: Vec<StoredProperty>,
    user_config: UserConfig,
    timestamp: Option<i64>,
}

impl ComputeContextBuilder {
    pub fn new(notes: Vec<Note>) -> Self {
        Self {
            notes,
            ..Self::default()
        }
    }

    pub fn with_properties(mut self, properties: Vec<StoredProperty>) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_user_config(mut self, user_config: UserConfig) -> Self {
        self.user_config = user_config;
        self
    }

    /// Pins the pass timestamp. Defaults to the wall clock at `build`.
    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// Validates inputs and freezes the context.
    ///
    /// Properties whose note is absent are dropped with a warning.
    ///
    /// # Errors
    /// - `DuplicateNoteId` when two notes share an id.
    pub fn build(self) -> Result<ComputeContext, ContextError> {
        let mut seen = HashSet::with_capacity(self.notes.len());
        for note in &self.notes {
            if !seen.insert(&note.id) {
                return Err(ContextError::DuplicateNoteId(note.id.clone()));
            }
        }

        let mut properties = Vec::with_capacity(self.properties.len());
        let mut dropped = 0usize;
        for property in self.properties {
            if seen.contains(&property.note_id) {
                properties.push(property);
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            warn!(
                "event=context_build module=feature status=ok dropped_orphan_properties={}",
                dropped
            );
        }

        let mut properties_by_note: HashMap<NoteId, Vec<usize>> = HashMap::new();
        for (position, property) in properties.iter().enumerate() {
            properties_by_note
                .entry(property.note_id.clone())
                .or_default()
                .push(position);
        }

        Ok(ComputeContext {
            notes: self.notes,
            properties,
            user_config: self.user_config,
            timestamp: self.timestamp.unwrap_or_else(now_epoch_ms),
            properties_by_note,
        })
    }
}

/// Context construction failures; they abort a whole recompute pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    DuplicateNoteId(NoteId),
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateNoteId(id) => write!(f, "duplicate note id in context: {id}"),
        }
    }
}

impl Error for ContextError {}

#[cfg(test)]
mod tests {
    use super::{ComputeContextBuilder, ContextError};
    use crate::model::note::{NewNote, Note, NoteId};
    use crate::model::property::StoredProperty;
    use crate::model::value::AttributeValue;

    #[test]
    fn indexes_properties_by_note_and_drops_orphans() {
        let note = Note::create(NewNote::new("a", "body"), 1);
        let props = vec![
            StoredProperty::new(note.id.clone(), "priority", AttributeValue::badge("High")),
            StoredProperty::new(NoteId::new("ghost"), "priority", AttributeValue::badge("Low")),
        ];
        let context = ComputeContextBuilder::new(vec![note.clone()])
            .with_properties(props)
            .at(42)
            .build()
            .expect("context builds");

        assert_eq!(context.timestamp(), 42);
        assert_eq!(context.all_properties().len(), 1);
        let for_note: Vec<_> = context.properties_for(&note.id).collect();
        assert_eq!(for_note.len(), 1);
        assert_eq!(context.properties_for(&NoteId::new("ghost")).count(), 0);
    }

    #[test]
    fn rejects_duplicate_note_ids() {
        let note = Note::create(NewNote::new("a", "body"), 1);
        let err = ComputeContextBuilder::new(vec![note.clone(), note.clone()])
            .build()
            .expect_err("duplicates must fail");
        assert_eq!(err, ContextError::DuplicateNoteId(note.id));
    }
}
