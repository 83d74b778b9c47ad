//! Note search over the published enriched snapshot.
//!
//! # Responsibility
//! - Combine free-text matching with typed attribute filters.
//! - Keep filtering in core so every presentation layer agrees on results.

pub mod query;
