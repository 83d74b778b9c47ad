//! Feature catalog, computation context and enrichment engine.
//!
//! # Responsibility
//! - Describe pluggable features (computed, property, rollup, behavior).
//! - Hold the injected registry instance shared by the application.
//! - Compute per-note attribute mappings with per-feature failure isolation.
//!
//! # Invariants
//! - The registry is populated serially before any computation runs.
//! - One failing feature never aborts enrichment of a note or a batch.

pub mod builtin;
pub mod context;
pub mod definition;
pub mod engine;
pub mod registry;
