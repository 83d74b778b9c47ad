//! Stored (user-entered) property records.

use crate::model::note::NoteId;
use crate::model::value::AttributeValue;
use serde::{Deserialize, Serialize};

/// User-entered value for one property-kind feature on one note.
///
/// Upsert semantics: `(note_id, feature_id)` identifies the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProperty {
    pub note_id: NoteId,
    pub feature_id: String,
    pub value: AttributeValue,
}

impl StoredProperty {
    pub fn new(note_id: NoteId, feature_id: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            note_id,
            feature_id: feature_id.into(),
            value,
        }
    }
}
