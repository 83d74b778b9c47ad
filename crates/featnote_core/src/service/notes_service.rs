//! Notes use-case service.
//!
//! # Responsibility
//! - Apply note, property and preference mutations through the repositories.
//! - Trigger a recompute after every change to notes, properties or the
//!   enabled feature set.
//! - Expose the published enriched snapshot and search over it.
//!
//! # Invariants
//! - The cached note list mirrors the repository after every successful
//!   mutation.
//! - Property writes are validated against the registered feature before
//!   any storage call.
//! - Preference writes are debounced and never fail a use-case.

use crate::enrich::controller::{RecomputeController, RecomputeOutcome, SubscriptionId};
use crate::enrich::snapshot::{EnrichedNote, SnapshotHandle};
use crate::feature::context::{ComputeContextBuilder, UserConfig};
use crate::feature::definition::PropertyValueError;
use crate::feature::registry::FeatureRegistry;
use crate::model::note::{now_epoch_ms, NewNote, Note, NoteId, NotePatch};
use crate::model::property::StoredProperty;
use crate::model::value::AttributeValue;
use crate::prefs::{DebouncedPreferencesWriter, FeaturePreferences};
use crate::repo::note_repo::NoteRepository;
use crate::repo::preferences_repo::PreferencesRepository;
use crate::repo::property_repo::PropertyRepository;
use crate::repo::RepoError;
use crate::search::query::{search, SearchQuery};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for note and property use-cases.
#[derive(Debug)]
pub enum ServiceError {
    Repo(RepoError),
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Feature id is not registered.
    UnknownFeature(String),
    InvalidPropertyValue(PropertyValueError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::UnknownFeature(id) => write!(f, "unknown feature: `{id}`"),
            Self::InvalidPropertyValue(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::InvalidPropertyValue(err) => Some(err),
            Self::NoteNotFound(_) | Self::UnknownFeature(_) => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<PropertyValueError> for ServiceError {
    fn from(value: PropertyValueError) -> Self {
        Self::InvalidPropertyValue(value)
    }
}

/// Notes facade over repositories, the feature registry and the recompute
/// controller.
pub struct NotesService<N, P, R>
where
    N: NoteRepository,
    P: PropertyRepository,
    R: PreferencesRepository,
{
    notes_repo: N,
    properties_repo: P,
    preferences_writer: DebouncedPreferencesWriter<R>,
    preferences: FeaturePreferences,
    registry: Arc<FeatureRegistry>,
    controller: RecomputeController,
    notes: Vec<Note>,
    clock: fn() -> i64,
}

impl<N, P, R> NotesService<N, P, R>
where
    N: NoteRepository,
    P: PropertyRepository,
    R: PreferencesRepository,
{
    /// Creates a service and loads stored preferences.
    ///
    /// Unreadable preferences are logged and replaced by defaults.
    pub fn new(
        registry: Arc<FeatureRegistry>,
        notes_repo: N,
        properties_repo: P,
        preferences_repo: R,
        preferences_debounce: Duration,
    ) -> Self {
        let preferences = match preferences_repo.load_preferences() {
            Ok(preferences) => preferences,
            Err(err) => {
                error!(
                    "event=prefs_load module=service status=error error_code=prefs_unavailable error={}",
                    err
                );
                FeaturePreferences::default()
            }
        };

        Self {
            notes_repo,
            properties_repo,
            preferences_writer: DebouncedPreferencesWriter::new(
                preferences_repo,
                preferences_debounce,
            ),
            preferences,
            registry,
            controller: RecomputeController::new(),
            notes: Vec::new(),
            clock: now_epoch_ms,
        }
    }

    /// Replaces the wall clock used for timestamps and recompute passes.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn preferences(&self) -> &FeaturePreferences {
        &self.preferences
    }

    pub fn enabled_features(&self) -> &[String] {
        &self.preferences.enabled_features
    }

    /// Current published snapshot handle.
    pub fn snapshot(&self) -> SnapshotHandle {
        self.controller.snapshot()
    }

    pub fn generation(&self) -> u64 {
        self.controller.generation()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&SnapshotHandle) + 'static,
    {
        self.controller.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.controller.unsubscribe(id)
    }

    /// Reloads every note from storage and recomputes.
    pub fn load_notes(&mut self) -> ServiceResult<RecomputeOutcome> {
        self.notes = self.notes_repo.list_notes()?;
        info!(
            "event=notes_load module=service status=ok notes={}",
            self.notes.len()
        );
        self.recompute()
    }

    /// Runs one recompute pass over the cached notes and stored properties.
    pub fn recompute(&mut self) -> ServiceResult<RecomputeOutcome> {
        let properties = self.properties_repo.list_properties()?;
        let inputs = ComputeContextBuilder::new(self.notes.clone())
            .with_properties(properties)
            .with_user_config(self.user_config())
            .at((self.clock)());
        Ok(self.controller.recompute(
            &self.registry,
            &self.preferences.enabled_features,
            inputs,
        ))
    }

    pub fn create_note(&mut self, input: NewNote) -> ServiceResult<Note> {
        let note = Note::create(input, (self.clock)());
        self.notes_repo.add_note(&note)?;
        self.load_notes()?;
        Ok(note)
    }

    pub fn update_note(&mut self, id: &NoteId, patch: NotePatch) -> ServiceResult<Note> {
        let note = self.notes_repo.update_note(id, patch, (self.clock)())?;
        self.load_notes()?;
        Ok(note)
    }

    /// Deletes a note together with its stored properties.
    pub fn delete_note(&mut self, id: &NoteId) -> ServiceResult<()> {
        self.notes_repo.delete_note(id)?;
        // Rows normally go with the note's cascade; this covers repositories
        // without foreign keys.
        self.properties_repo.delete_properties(id)?;
        self.load_notes()?;
        Ok(())
    }

    /// Stores a typed property value for one note.
    pub fn set_note_property(
        &mut self,
        note_id: &NoteId,
        feature_id: &str,
        value: AttributeValue,
    ) -> ServiceResult<RecomputeOutcome> {
        if self.registry.get(feature_id).is_none() {
            return Err(ServiceError::UnknownFeature(feature_id.to_string()));
        }
        if !self.notes.iter().any(|note| &note.id == note_id) {
            return Err(ServiceError::NoteNotFound(note_id.clone()));
        }

        let property = StoredProperty::new(note_id.clone(), feature_id, value);
        self.properties_repo.put_property(&property)?;
        info!(
            "event=property_set module=service status=ok feature_id={} value_kind={}",
            feature_id,
            property.value.kind_name()
        );
        self.recompute()
    }

    /// Parses user text for a property feature, then stores it.
    pub fn set_note_property_text(
        &mut self,
        note_id: &NoteId,
        feature_id: &str,
        raw: &str,
    ) -> ServiceResult<RecomputeOutcome> {
        let value = self
            .registry
            .get(feature_id)
            .ok_or_else(|| ServiceError::UnknownFeature(feature_id.to_string()))?
            .property_value(raw)?;
        self.set_note_property(note_id, feature_id, value)
    }

    /// Enables one registered feature, storing `config` or its defaults.
    pub fn enable_feature(
        &mut self,
        feature_id: &str,
        config: Option<serde_json::Value>,
    ) -> ServiceResult<RecomputeOutcome> {
        let registry = Arc::clone(&self.registry);
        let definition = registry
            .get(feature_id)
            .ok_or_else(|| ServiceError::UnknownFeature(feature_id.to_string()))?;
        if !self.preferences.enable(definition, config) {
            return Ok(RecomputeOutcome::Skipped);
        }
        self.preferences_changed()
    }

    pub fn disable_feature(&mut self, feature_id: &str) -> ServiceResult<RecomputeOutcome> {
        if !self.preferences.disable(feature_id) {
            return Ok(RecomputeOutcome::Skipped);
        }
        self.preferences_changed()
    }

    /// Replaces the enabled feature list as given, order included.
    pub fn set_enabled_features<S: AsRef<str>>(
        &mut self,
        feature_ids: &[S],
    ) -> ServiceResult<RecomputeOutcome> {
        let mut enabled: Vec<String> = Vec::with_capacity(feature_ids.len());
        for id in feature_ids {
            let id = id.as_ref();
            if !enabled.iter().any(|seen| seen == id) {
                enabled.push(id.to_string());
            }
        }
        self.preferences.enabled_features = enabled;
        self.preferences_changed()
    }

    pub fn update_feature_config(
        &mut self,
        feature_id: &str,
        config: serde_json::Value,
    ) -> ServiceResult<RecomputeOutcome> {
        self.preferences.update_config(feature_id, config);
        self.preferences_changed()
    }

    /// Writes any debounced preference change now.
    pub fn flush_preferences(&mut self) {
        self.preferences_writer.flush();
    }

    /// Filters the published snapshot, in snapshot order.
    pub fn search(&self, query: &SearchQuery) -> Vec<EnrichedNote> {
        search(self.controller.current(), &self.registry, query)
            .into_iter()
            .cloned()
            .collect()
    }

    fn user_config(&self) -> UserConfig {
        self.preferences.feature_configs.clone()
    }

    fn preferences_changed(&mut self) -> ServiceResult<RecomputeOutcome> {
        self.preferences_writer.save(&self.preferences);
        self.recompute()
    }
}
