//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record owned by persistence.
//! - Provide creation and partial-update helpers that keep timestamps sane.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `updated_at >= created_at`.
//! - `updated_at` strictly increases on every applied patch.
//! - `tags` hold no duplicates; first occurrence order is preserved.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable opaque identifier for one note.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Wraps an externally provided identifier (import/sync paths).
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Canonical note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    /// Free text body.
    pub content: String,
    pub tags: Vec<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Never earlier than `created_at`.
    pub updated_at: i64,
}

/// Creation input; identity and timestamps are assigned by [`Note::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl NewNote {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl NotePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.tags.is_none()
    }
}

impl Note {
    /// Creates a note with a generated id, both timestamps set to `now_ms`.
    pub fn create(input: NewNote, now_ms: i64) -> Self {
        Self {
            id: NoteId::generate(),
            title: input.title,
            content: input.content,
            tags: dedup_tags(input.tags),
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Applies a partial update and bumps `updated_at`.
    ///
    /// When the wall clock did not advance past the previous `updated_at`
    /// the timestamp is bumped by one millisecond instead.
    pub fn apply_patch(&mut self, patch: NotePatch, now_ms: i64) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(tags) = patch.tags {
            self.tags = dedup_tags(tags);
        }
        self.updated_at = next_updated_at(self.updated_at, now_ms);
    }

    /// Validates record-level invariants.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(NoteValidationError::EmptyId);
        }
        if self.updated_at < self.created_at {
            return Err(NoteValidationError::UpdatedBeforeCreated {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        for (position, tag) in self.tags.iter().enumerate() {
            if self.tags[..position].contains(tag) {
                return Err(NoteValidationError::DuplicateTag(tag.clone()));
            }
        }
        Ok(())
    }
}

/// Returns the timestamp a mutation at `now_ms` should record.
pub fn next_updated_at(previous: i64, now_ms: i64) -> i64 {
    if now_ms > previous {
        now_ms
    } else {
        previous.saturating_add(1)
    }
}

/// Removes duplicate and blank tags, keeping first occurrence order.
pub fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() || unique.iter().any(|seen| seen == trimmed) {
            continue;
        }
        unique.push(trimmed.to_string());
    }
    unique
}

/// Current wall clock in epoch milliseconds.
///
/// Clamps to `0` if the clock reports a time before the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Note invariant violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyId,
    UpdatedBeforeCreated { created_at: i64, updated_at: i64 },
    DuplicateTag(String),
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "note id must not be empty"),
            Self::UpdatedBeforeCreated {
                created_at,
                updated_at,
            } => write!(
                f,
                "note updated_at ({updated_at}) is earlier than created_at ({created_at})"
            ),
            Self::DuplicateTag(tag) => write!(f, "note tag is duplicated: {tag}"),
        }
    }
}

impl Error for NoteValidationError {}

#[cfg(test)]
mod tests {
    use super::{dedup_tags, NewNote, Note, NoteId, NotePatch, NoteValidationError};

    #[test]
    fn create_assigns_identity_and_equal_timestamps() {
        let note = Note::create(NewNote::new("t", "c").with_tags(["a", "a", " b "]), 1_000);
        assert!(!note.id.as_str().is_empty());
        assert_eq!(note.created_at, 1_000);
        assert_eq!(note.updated_at, 1_000);
        assert_eq!(note.tags, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn patch_strictly_increases_updated_at_even_with_stale_clock() {
        let mut note = Note::create(NewNote::new("t", "c"), 5_000);
        note.apply_patch(
            NotePatch {
                content: Some("new".to_string()),
                ..NotePatch::default()
            },
            4_000,
        );
        assert_eq!(note.content, "new");
        assert_eq!(note.updated_at, 5_001);

        note.apply_patch(NotePatch::default(), 9_000);
        assert_eq!(note.updated_at, 9_000);
    }

    #[test]
    fn validate_rejects_blank_id_and_inverted_timestamps() {
        let mut note = Note::create(NewNote::new("t", "c"), 10);
        note.id = NoteId::new("  ");
        assert_eq!(note.validate(), Err(NoteValidationError::EmptyId));

        let mut note = Note::create(NewNote::new("t", "c"), 10);
        note.updated_at = 5;
        assert!(matches!(
            note.validate(),
            Err(NoteValidationError::UpdatedBeforeCreated { .. })
        ));
    }

    #[test]
    fn dedup_tags_keeps_first_occurrence_order() {
        let tags = dedup_tags(vec![
            "work".to_string(),
            "".to_string(),
            "home".to_string(),
            "work".to_string(),
        ]);
        assert_eq!(tags, vec!["work".to_string(), "home".to_string()]);
    }
}
