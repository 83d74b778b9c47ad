//! Incremental recompute controller.
//!
//! # Responsibility
//! - Drive one recompute pass: context build, batch enrichment, diff, publish.
//! - Own the published snapshot and its subscriber list.
//!
//! # Invariants
//! - The published handle is replaced only when note membership changes
//!   (different id set or size). Value-only changes keep the old handle.
//! - Empty input and failed context construction leave the handle untouched.
//! - Subscribers run only after a replacement and receive the new handle.
//! - Passes are serialized through `&mut self`; subscribers cannot re-enter.

use crate::enrich::snapshot::{EnrichedNote, EnrichedSnapshot, SnapshotHandle};
use crate::feature::context::{ComputeContextBuilder, ContextError};
use crate::feature::engine::FeatureEngine;
use crate::feature::registry::FeatureRegistry;
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

/// Recompute lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeState {
    Idle,
    Computing,
    Diffing,
}

/// Whole-pass failure. The previous snapshot is always preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecomputeError {
    Context(ContextError),
}

impl Display for RecomputeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Context(err) => write!(f, "recompute aborted: {err}"),
        }
    }
}

impl Error for RecomputeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Context(err) => Some(err),
        }
    }
}

impl From<ContextError> for RecomputeError {
    fn from(value: ContextError) -> Self {
        Self::Context(value)
    }
}

/// Result of one recompute trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecomputeOutcome {
    /// Input had no notes; nothing was computed.
    Skipped,
    /// Membership unchanged; the previous handle stays published.
    Unchanged { feature_failures: usize },
    /// A new handle was published under `generation`.
    Published {
        generation: u64,
        feature_failures: usize,
    },
    /// Context construction failed; the previous handle stays published.
    Aborted(RecomputeError),
}

impl RecomputeOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }
}

/// Opaque subscription handle returned by [`RecomputeController::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&SnapshotHandle)>;

/// Sole owner and writer of the published enriched snapshot.
pub struct RecomputeController {
    published: SnapshotHandle,
    state: RecomputeState,
    generation: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl Default for RecomputeController {
    fn default() -> Self {
        Self::new()
    }
}

impl RecomputeController {
    /// Starts with an empty published snapshot at generation `0`.
    pub fn new() -> Self {
        Self {
            published: Arc::new(EnrichedSnapshot::new()),
            state: RecomputeState::Idle,
            generation: 0,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Current published handle.
    pub fn snapshot(&self) -> SnapshotHandle {
        Arc::clone(&self.published)
    }

    /// Borrowed view of the published snapshot.
    pub fn current(&self) -> &EnrichedSnapshot {
        &self.published
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> RecomputeState {
        self.state
    }

    /// Registers a callback invoked with every newly published handle.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&SnapshotHandle) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Removes one subscriber. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(current, _)| *current != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Runs one recompute pass over `inputs` with the `enabled_ids` features.
    ///
    /// Never fails: whole-pass errors are logged and reported as
    /// [`RecomputeOutcome::Aborted`] while the published snapshot is kept.
    pub fn recompute<S: AsRef<str>>(
        &mut self,
        registry: &FeatureRegistry,
        enabled_ids: &[S],
        inputs: ComputeContextBuilder,
    ) -> RecomputeOutcome {
        if inputs.note_count() == 0 {
            debug!("event=recompute module=enrich status=skip reason=no_notes");
            return RecomputeOutcome::Skipped;
        }

        let started_at = Instant::now();
        self.state = RecomputeState::Computing;

        let context = match inputs.build() {
            Ok(context) => context,
            Err(err) => {
                self.state = RecomputeState::Idle;
                let err = RecomputeError::from(err);
                error!(
                    "event=recompute module=enrich status=error error_code=recompute_aborted duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return RecomputeOutcome::Aborted(err);
            }
        };

        let engine = FeatureEngine::new(registry, enabled_ids);
        let computed = engine.compute_for_all_notes(context.all_notes(), &context);
        let feature_failures = computed.iter().map(|entry| entry.failures.len()).sum();

        let candidate: EnrichedSnapshot = context
            .into_notes()
            .into_iter()
            .zip(computed)
            .map(|(note, entry)| EnrichedNote::new(note, entry.attributes))
            .collect();

        self.state = RecomputeState::Diffing;
        let outcome = if candidate.same_membership(&self.published) {
            debug!(
                "event=recompute module=enrich status=ok result=unchanged notes={} feature_failures={} duration_ms={}",
                candidate.len(),
                feature_failures,
                started_at.elapsed().as_millis()
            );
            RecomputeOutcome::Unchanged { feature_failures }
        } else {
            info!(
                "event=recompute module=enrich status=ok result=published previous_notes={} notes={} feature_failures={} duration_ms={}",
                self.published.len(),
                candidate.len(),
                feature_failures,
                started_at.elapsed().as_millis()
            );
            self.publish(candidate);
            RecomputeOutcome::Published {
                generation: self.generation,
                feature_failures,
            }
        };
        self.state = RecomputeState::Idle;
        outcome
    }

    fn publish(&mut self, snapshot: EnrichedSnapshot) {
        self.published = Arc::new(snapshot);
        self.generation += 1;
        let handle = Arc::clone(&self.published);
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&handle);
        }
    }
}
