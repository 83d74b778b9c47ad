//! Enriched note records and the immutable snapshot handed to consumers.

use crate::model::note::{Note, NoteId};
use crate::model::value::{AttributeMap, AttributeValue};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Note widened with its computed and stored attribute values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedNote {
    #[serde(flatten)]
    pub note: Note,
    pub attributes: AttributeMap,
}

impl EnrichedNote {
    pub fn new(note: Note, attributes: AttributeMap) -> Self {
        Self { note, attributes }
    }

    pub fn id(&self) -> &NoteId {
        &self.note.id
    }

    pub fn attribute(&self, role: &str) -> Option<&AttributeValue> {
        self.attributes.get(role)
    }
}

/// Ordered note id -> enriched note mapping, iterated in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedSnapshot {
    notes: Vec<EnrichedNote>,
    positions: HashMap<NoteId, usize>,
}

/// Shared read-only handle; consumers compare handles with [`Arc::ptr_eq`].
pub type SnapshotHandle = Arc<EnrichedSnapshot>;

impl EnrichedSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts one note; a repeated id replaces the earlier entry in place.
    pub fn insert(&mut self, enriched: EnrichedNote) {
        match self.positions.get(enriched.id()) {
            Some(&position) => self.notes[position] = enriched,
            None => {
                self.positions
                    .insert(enriched.id().clone(), self.notes.len());
                self.notes.push(enriched);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, note_id: &NoteId) -> Option<&EnrichedNote> {
        self.positions
            .get(note_id)
            .and_then(|&position| self.notes.get(position))
    }

    pub fn contains(&self, note_id: &NoteId) -> bool {
        self.positions.contains_key(note_id)
    }

    /// Enriched notes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &EnrichedNote> {
        self.notes.iter()
    }

    /// Order-independent set of note ids.
    pub fn key_set(&self) -> BTreeSet<&NoteId> {
        self.positions.keys().collect()
    }

    /// Whether both snapshots hold the same note ids (values ignored).
    pub fn same_membership(&self, other: &EnrichedSnapshot) -> bool {
        self.len() == other.len() && self.key_set() == other.key_set()
    }
}

impl FromIterator<EnrichedNote> for EnrichedSnapshot {
    fn from_iter<T: IntoIterator<Item = EnrichedNote>>(iter: T) -> Self {
        let mut snapshot = Self::new();
        for enriched in iter {
            snapshot.insert(enriched);
        }
        snapshot
    }
}
