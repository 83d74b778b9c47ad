use featnote_core::{
    AttributeValue, ComputeContext, ComputeContextBuilder, ComputeResult, FeatureCategory,
    FeatureDefinition, FeatureEngine, FeatureKind, FeatureRegistry, NewNote, Note, StoredProperty,
    TagCount,
};
use std::collections::BTreeSet;

const NOW: i64 = 1_700_000_000_000;

fn context(notes: Vec<Note>, properties: Vec<StoredProperty>) -> ComputeContext {
    ComputeContextBuilder::new(notes)
        .with_properties(properties)
        .at(NOW)
        .build()
        .unwrap()
}

fn always_fails(_note: &Note, _context: &ComputeContext) -> ComputeResult {
    Err("boom".to_string())
}

#[test]
fn attribute_keys_are_exactly_the_enabled_roles() {
    let registry = FeatureRegistry::with_builtin_features();
    let note = Note::create(NewNote::new("t", "one two three"), NOW);
    let ctx = context(vec![note.clone()], Vec::new());
    let engine = FeatureEngine::new(&registry, &["word-count", "priority", "not-registered"]);

    let attributes = engine.compute_for_note(&note, &ctx);

    // `priority` has no stored value, so only the computed role appears.
    let keys: BTreeSet<&str> = attributes.keys().map(String::as_str).collect();
    assert_eq!(keys, BTreeSet::from(["word-count"]));
    assert_eq!(attributes["word-count"], AttributeValue::Number(3));
}

#[test]
fn stored_property_appears_under_its_role() {
    let registry = FeatureRegistry::with_builtin_features();
    let note = Note::create(NewNote::new("t", "body"), NOW);
    let ctx = context(
        vec![note.clone()],
        vec![StoredProperty::new(
            note.id.clone(),
            "priority",
            AttributeValue::badge("High"),
        )],
    );
    let engine = FeatureEngine::new(&registry, &["word-count", "priority"]);

    let attributes = engine.compute_for_note(&note, &ctx);
    assert_eq!(attributes.len(), 2);
    assert_eq!(attributes["priority"], AttributeValue::badge("High"));
}

#[test]
fn stored_property_overrides_computed_value_on_shared_role() {
    let mut registry = FeatureRegistry::with_builtin_features();
    registry
        .register(
            FeatureDefinition::new(
                "manual-words",
                "Manual Words",
                FeatureKind::Property,
                FeatureCategory::Analytics,
            )
            .with_attribute_role("word-count"),
        )
        .unwrap();
    let note = Note::create(NewNote::new("t", "one two"), NOW);
    let ctx = context(
        vec![note.clone()],
        vec![StoredProperty::new(
            note.id.clone(),
            "manual-words",
            AttributeValue::Number(99),
        )],
    );
    let engine = FeatureEngine::new(&registry, &["word-count", "manual-words"]);

    let attributes = engine.compute_for_note(&note, &ctx);
    assert_eq!(attributes["word-count"], AttributeValue::Number(99));
}

#[test]
fn computing_twice_yields_equal_mappings() {
    let registry = FeatureRegistry::with_builtin_features();
    let note = Note::create(NewNote::new("t", "alpha beta").with_tags(["x"]), NOW - 3_600_000);
    let ctx = context(vec![note.clone()], Vec::new());
    let all: Vec<&str> = registry.get_all().iter().map(|def| def.id.as_str()).collect();
    let engine = FeatureEngine::new(&registry, &all);

    assert_eq!(
        engine.compute_for_note(&note, &ctx),
        engine.compute_for_note(&note, &ctx)
    );
    assert_eq!(
        engine.compute_for_note(&note, &ctx)["last-edited"],
        AttributeValue::text("1h ago")
    );
}

#[test]
fn four_hundred_words_read_in_two_minutes() {
    let registry = FeatureRegistry::with_builtin_features();
    let content = vec!["word"; 400].join(" ");
    let note = Note::create(NewNote::new("long", content), NOW);
    let ctx = context(vec![note.clone()], Vec::new());
    let engine = FeatureEngine::new(&registry, &["reading-time"]);

    assert_eq!(
        engine.compute_for_note(&note, &ctx)["reading-time"],
        AttributeValue::text("2 min")
    );
}

#[test]
fn tag_stats_rank_tags_across_all_notes() {
    let registry = FeatureRegistry::with_builtin_features();
    let first = Note::create(NewNote::new("1", "").with_tags(["a", "b"]), NOW);
    let second = Note::create(NewNote::new("2", "").with_tags(["a", "c"]), NOW);
    let ctx = context(vec![first.clone(), second.clone()], Vec::new());
    let engine = FeatureEngine::new(&registry, &["tag-stats", "total-notes"]);

    let expected = AttributeValue::Ranking(vec![
        TagCount::new("a", 2),
        TagCount::new("b", 1),
        TagCount::new("c", 1),
    ]);
    for note in [&first, &second] {
        let attributes = engine.compute_for_note(note, &ctx);
        assert_eq!(attributes["tag-stats"], expected);
        assert_eq!(attributes["total-notes"], AttributeValue::Number(2));
    }
}

#[test]
fn failing_feature_is_isolated() {
    let mut registry = FeatureRegistry::with_builtin_features();
    registry
        .register(
            FeatureDefinition::new(
                "broken",
                "Broken",
                FeatureKind::Computed,
                FeatureCategory::Automation,
            )
            .with_attribute_role("broken")
            .with_compute(always_fails),
        )
        .unwrap();
    let notes = vec![
        Note::create(NewNote::new("1", "a b"), NOW),
        Note::create(NewNote::new("2", "c"), NOW),
    ];
    let ctx = context(notes.clone(), Vec::new());
    let engine = FeatureEngine::new(&registry, &["broken", "word-count"]);

    let computed = engine.compute_for_all_notes(&notes, &ctx);
    assert_eq!(computed.len(), 2);
    assert_eq!(computed[0].note_id, notes[0].id);
    assert_eq!(computed[0].attributes["word-count"], AttributeValue::Number(2));
    assert_eq!(computed[1].attributes["word-count"], AttributeValue::Number(1));
    for entry in &computed {
        assert!(!entry.attributes.contains_key("broken"));
        assert_eq!(entry.failures.len(), 1);
        assert_eq!(entry.failures[0].feature_id, "broken");
        assert_eq!(entry.failures[0].message, "boom");
    }
}
