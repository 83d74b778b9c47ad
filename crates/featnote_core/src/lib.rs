//! Feature computation and incremental enrichment core for featnote.
//! This crate owns feature definitions, note enrichment and the published
//! enriched snapshot; storage and presentation sit behind its traits.

pub mod config;
pub mod db;
pub mod enrich;
pub mod feature;
pub mod logging;
pub mod model;
pub mod prefs;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use enrich::controller::{
    RecomputeController, RecomputeError, RecomputeOutcome, RecomputeState, SubscriptionId,
};
pub use enrich::snapshot::{EnrichedNote, EnrichedSnapshot, SnapshotHandle};
pub use feature::context::{ComputeContext, ComputeContextBuilder, ContextError, UserConfig};
pub use feature::definition::{
    ComputeFn, ComputeResult, DefaultConfig, FeatureCategory, FeatureDefinition, FeatureKind,
    PropertyValueError, RenderHint,
};
pub use feature::engine::{FeatureComputationError, FeatureEngine, NoteAttributes};
pub use feature::registry::{FeatureRegistry, FeatureRegistryError};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::note::{NewNote, Note, NoteId, NotePatch, NoteValidationError};
pub use model::property::StoredProperty;
pub use model::value::{AttributeMap, AttributeValue, TagCount};
pub use prefs::{DebouncedPreferencesWriter, FeaturePreferences, SaveDisposition};
pub use repo::bulk::replace_all;
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::preferences_repo::{PreferencesRepository, SqlitePreferencesRepository};
pub use repo::property_repo::{PropertyRepository, SqlitePropertyRepository};
pub use repo::{RepoError, RepoResult};
pub use search::query::{search, SearchQuery};
pub use service::notes_service::{NotesService, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
