use featnote_core::{
    AttributeValue, ComputeContext, ComputeContextBuilder, ComputeResult, ContextError,
    FeatureCategory, FeatureDefinition, FeatureKind, FeatureRegistry, NewNote, Note,
    RecomputeController, RecomputeError, RecomputeOutcome, RecomputeState,
};
use std::sync::Arc;

const ENABLED: [&str; 2] = ["word-count", "total-notes"];

fn note(title: &str, content: &str) -> Note {
    Note::create(NewNote::new(title, content), 1_000)
}

fn unavailable(_note: &Note, _context: &ComputeContext) -> ComputeResult {
    Err("unavailable".to_string())
}

fn inputs(notes: &[Note]) -> ComputeContextBuilder {
    ComputeContextBuilder::new(notes.to_vec()).at(2_000)
}

#[test]
fn same_membership_keeps_the_published_handle() {
    let registry = FeatureRegistry::with_builtin_features();
    let mut controller = RecomputeController::new();
    let mut notes = vec![note("a", "one"), note("b", "two")];

    let first = controller.recompute(&registry, &ENABLED, inputs(&notes));
    assert_eq!(
        first,
        RecomputeOutcome::Published {
            generation: 1,
            feature_failures: 0
        }
    );
    let published = controller.snapshot();

    // Value-only change: the previous handle and its values stay published.
    notes[0].content = "one two three".to_string();
    let second = controller.recompute(&registry, &ENABLED, inputs(&notes));
    assert!(matches!(second, RecomputeOutcome::Unchanged { .. }));
    assert!(Arc::ptr_eq(&published, &controller.snapshot()));
    assert_eq!(
        controller
            .current()
            .get(&notes[0].id)
            .unwrap()
            .attribute("word-count"),
        Some(&AttributeValue::Number(1))
    );
    assert_eq!(controller.generation(), 1);
}

#[test]
fn membership_change_publishes_a_new_handle() {
    let registry = FeatureRegistry::with_builtin_features();
    let mut controller = RecomputeController::new();
    let mut notes = vec![note("a", "one")];
    controller.recompute(&registry, &ENABLED, inputs(&notes));
    let before = controller.snapshot();

    notes.push(note("b", "two words"));
    let outcome = controller.recompute(&registry, &ENABLED, inputs(&notes));

    assert!(outcome.is_published());
    let after = controller.snapshot();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(before.len(), 1);
    assert_eq!(after.len(), 2);
    let ids: Vec<_> = after.iter().map(|enriched| enriched.id().clone()).collect();
    assert_eq!(ids, vec![notes[0].id.clone(), notes[1].id.clone()]);
    assert_eq!(
        after.get(&notes[1].id).unwrap().attribute("total-notes"),
        Some(&AttributeValue::Number(2))
    );
}

#[test]
fn empty_input_leaves_snapshot_untouched() {
    let registry = FeatureRegistry::with_builtin_features();
    let mut controller = RecomputeController::new();
    let notes = vec![note("a", "one")];
    controller.recompute(&registry, &ENABLED, inputs(&notes));
    let before = controller.snapshot();

    let outcome = controller.recompute(&registry, &ENABLED, inputs(&[]));

    assert_eq!(outcome, RecomputeOutcome::Skipped);
    assert!(Arc::ptr_eq(&before, &controller.snapshot()));
    assert_eq!(controller.current().len(), 1);
}

#[test]
fn duplicate_note_ids_abort_and_keep_previous_snapshot() {
    let registry = FeatureRegistry::with_builtin_features();
    let mut controller = RecomputeController::new();
    let original = note("a", "one");
    controller.recompute(&registry, &ENABLED, inputs(&[original.clone()]));
    let before = controller.snapshot();

    let outcome = controller.recompute(
        &registry,
        &ENABLED,
        inputs(&[original.clone(), note("b", "x"), original.clone()]),
    );

    assert_eq!(
        outcome,
        RecomputeOutcome::Aborted(RecomputeError::Context(ContextError::DuplicateNoteId(
            original.id.clone()
        )))
    );
    assert!(Arc::ptr_eq(&before, &controller.snapshot()));
    assert_eq!(controller.state(), RecomputeState::Idle);
}

#[test]
fn feature_failures_are_counted_not_fatal() {
    let mut registry = FeatureRegistry::new();
    registry
        .register(
            FeatureDefinition::new(
                "broken",
                "Broken",
                FeatureKind::Rollup,
                FeatureCategory::Analytics,
            )
            .with_attribute_role("broken")
            .with_compute(unavailable),
        )
        .unwrap();
    let mut controller = RecomputeController::new();

    let outcome = controller.recompute(
        &registry,
        &["broken"],
        inputs(&[note("a", "x"), note("b", "y")]),
    );

    assert_eq!(
        outcome,
        RecomputeOutcome::Published {
            generation: 1,
            feature_failures: 2
        }
    );
    assert!(controller
        .current()
        .iter()
        .all(|enriched| enriched.attributes.is_empty()));
}
