//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and recompute triggers into use-case APIs.
//! - Keep presentation and bootstrap layers decoupled from storage details.

pub mod notes_service;
