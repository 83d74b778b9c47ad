//! Enriched snapshot ownership and incremental recompute.
//!
//! # Responsibility
//! - Hold the single published snapshot of enriched notes.
//! - Replace it only on structural (note membership) change.
//! - Notify subscribers with the new immutable handle.
//!
//! # Invariants
//! - Only [`controller::RecomputeController`] writes the published snapshot.
//! - A failed or empty recompute never clears the published snapshot.

pub mod controller;
pub mod snapshot;
