//! Domain model for notes, stored properties and enriched attribute values.
//!
//! # Responsibility
//! - Define canonical data structures shared by repositories, the feature
//!   engine and the recompute controller.
//! - Keep attribute values typed so filters and renderers can match
//!   exhaustively.
//!
//! # Invariants
//! - Every note is identified by a stable, non-empty `NoteId`.
//! - At most one stored property exists per `(note_id, feature_id)` pair.

pub mod note;
pub mod property;
pub mod value;
