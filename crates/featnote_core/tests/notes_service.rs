use featnote_core::db::open_db_in_memory;
use featnote_core::{
    AttributeValue, FeatureRegistry, NewNote, NotePatch, NotesService, PreferencesRepository,
    RecomputeOutcome, SearchQuery, ServiceError, SnapshotHandle, SqliteNoteRepository,
    SqlitePreferencesRepository, SqlitePropertyRepository,
};
use rusqlite::Connection;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

type Service<'c> = NotesService<
    SqliteNoteRepository<'c>,
    SqlitePropertyRepository<'c>,
    SqlitePreferencesRepository<'c>,
>;

fn fixed_clock() -> i64 {
    1_700_000_000_000
}

fn service(conn: &Connection, debounce: Duration) -> Service<'_> {
    NotesService::new(
        Arc::new(FeatureRegistry::with_builtin_features()),
        SqliteNoteRepository::new(conn),
        SqlitePropertyRepository::new(conn),
        SqlitePreferencesRepository::new(conn),
        debounce,
    )
    .with_clock(fixed_clock)
}

#[test]
fn creating_notes_publishes_enriched_snapshots() {
    let conn = open_db_in_memory().unwrap();
    let mut service = service(&conn, Duration::ZERO);
    let published: Rc<RefCell<Vec<SnapshotHandle>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&published);
    service.subscribe(move |handle| sink.borrow_mut().push(Arc::clone(handle)));

    let first = service
        .create_note(NewNote::new("Welcome to Notes", "hello there world"))
        .unwrap();
    service.create_note(NewNote::new("Second", "x")).unwrap();

    assert_eq!(published.borrow().len(), 2);
    assert_eq!(service.generation(), 2);
    let snapshot = service.snapshot();
    let enriched = snapshot.get(&first.id).unwrap();
    assert_eq!(
        enriched.attribute("word-count"),
        Some(&AttributeValue::Number(3))
    );
    assert_eq!(
        enriched.attribute("last-edited"),
        Some(&AttributeValue::text("just now"))
    );
}

#[test]
fn property_write_becomes_visible_on_next_membership_change() {
    let conn = open_db_in_memory().unwrap();
    let mut service = service(&conn, Duration::ZERO);
    service.enable_feature("priority", None).unwrap();
    let note = service.create_note(NewNote::new("a", "b")).unwrap();
    let before = service.snapshot();

    let outcome = service
        .set_note_property_text(&note.id, "priority", "High")
        .unwrap();

    // Same note set: the published handle, and its values, stay as they were.
    assert!(matches!(outcome, RecomputeOutcome::Unchanged { .. }));
    assert!(Arc::ptr_eq(&before, &service.snapshot()));
    assert_eq!(service.snapshot().get(&note.id).unwrap().attribute("priority"), None);

    service.create_note(NewNote::new("c", "d")).unwrap();
    assert_eq!(
        service.snapshot().get(&note.id).unwrap().attribute("priority"),
        Some(&AttributeValue::badge("High"))
    );

    let high = service.search(
        &SearchQuery::default().with_filter("priority", AttributeValue::badge("High")),
    );
    assert_eq!(high.len(), 1);
    assert_eq!(high[0].note.id, note.id);
}

#[test]
fn update_and_delete_flow_through_to_the_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let mut service = service(&conn, Duration::ZERO);
    let keep = service.create_note(NewNote::new("keep", "one")).unwrap();
    let doomed = service.create_note(NewNote::new("drop", "two")).unwrap();
    service
        .set_note_property_text(&doomed.id, "status", "Draft")
        .unwrap();

    let updated = service
        .update_note(
            &keep.id,
            NotePatch {
                title: Some("kept".into()),
                ..NotePatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.title, "kept");
    assert!(updated.updated_at > keep.updated_at);

    service.delete_note(&doomed.id).unwrap();
    assert_eq!(service.notes().len(), 1);
    assert!(!service.snapshot().contains(&doomed.id));
    assert!(matches!(
        service.delete_note(&doomed.id),
        Err(ServiceError::NoteNotFound(_))
    ));
}

#[test]
fn deleting_the_last_note_keeps_the_previous_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let mut service = service(&conn, Duration::ZERO);
    let only = service.create_note(NewNote::new("only", "x")).unwrap();

    service.delete_note(&only.id).unwrap();

    assert!(service.notes().is_empty());
    assert!(service.snapshot().contains(&only.id));
}

#[test]
fn enabled_features_are_persisted_and_reloaded() {
    let conn = open_db_in_memory().unwrap();
    {
        let mut service = service(&conn, Duration::from_secs(60));
        service.enable_feature("priority", None).unwrap();
        service.disable_feature("last-edited").unwrap();
        service.flush_preferences();
    }

    let stored = SqlitePreferencesRepository::new(&conn)
        .load_preferences()
        .unwrap();
    assert_eq!(stored.enabled_features, vec!["word-count", "priority"]);

    let reloaded = service(&conn, Duration::ZERO);
    assert_eq!(reloaded.enabled_features(), &["word-count", "priority"]);
    assert!(reloaded.preferences().feature_configs.contains_key("priority"));
}

#[test]
fn last_toggle_inside_debounce_window_survives_drop() {
    let conn = open_db_in_memory().unwrap();
    {
        let mut service = service(&conn, Duration::from_millis(500));
        service.enable_feature("priority", None).unwrap();
        service.disable_feature("word-count").unwrap();
    }

    let reloaded = service(&conn, Duration::ZERO);
    assert_eq!(reloaded.enabled_features(), &["last-edited", "priority"]);
}

#[test]
fn unknown_feature_cannot_be_enabled() {
    let conn = open_db_in_memory().unwrap();
    let mut service = service(&conn, Duration::ZERO);
    assert!(matches!(
        service.enable_feature("telepathy", None),
        Err(ServiceError::UnknownFeature(id)) if id == "telepathy"
    ));
}
