//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist notes and their ordered tag lists.
//! - Apply partial updates with strictly increasing `updated_at`.
//!
//! # Invariants
//! - `list_notes` returns notes in insertion order (`created_at`, then rowid).
//! - Tags are replaced as a whole inside the note's write transaction.
//! - Deleting a note cascades to its tags and stored properties.

use crate::model::note::{Note, NoteId, NotePatch};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::collections::HashMap;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    created_at,
    updated_at
FROM notes";

/// Repository interface for note operations.
pub trait NoteRepository {
    /// Lists every note in insertion order.
    fn list_notes(&self) -> RepoResult<Vec<Note>>;
    fn get_note(&self, id: &NoteId) -> RepoResult<Option<Note>>;
    /// Inserts one validated note.
    fn add_note(&self, note: &Note) -> RepoResult<()>;
    /// Applies `patch` at `now_ms` and returns the stored result.
    fn update_note(&self, id: &NoteId, patch: NotePatch, now_ms: i64) -> RepoResult<Note>;
    /// Deletes one note; its tags and properties go with it.
    fn delete_note(&self, id: &NoteId) -> RepoResult<()>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        let mut tags = load_all_tags(self.conn)?;
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            let mut note = parse_note_row(row)?;
            note.tags = tags.remove(&note.id).unwrap_or_default();
            notes.push(note);
        }
        Ok(notes)
    }

    fn get_note(&self, id: &NoteId) -> RepoResult<Option<Note>> {
        get_note_with(self.conn, id)
    }

    fn add_note(&self, note: &Note) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_note(&tx, note)?;
        tx.commit()?;
        Ok(())
    }

    fn update_note(&self, id: &NoteId, patch: NotePatch, now_ms: i64) -> RepoResult<Note> {
        let tx = self.conn.unchecked_transaction()?;
        let mut note = get_note_with(&tx, id)?.ok_or_else(|| RepoError::NotFound(id.clone()))?;
        let replace_tags = patch.tags.is_some();
        note.apply_patch(patch, now_ms);
        note.validate()?;

        tx.execute(
            "UPDATE notes
             SET
                title = ?2,
                content = ?3,
                updated_at = ?4
             WHERE id = ?1;",
            params![
                note.id.as_str(),
                note.title.as_str(),
                note.content.as_str(),
                note.updated_at,
            ],
        )?;
        if replace_tags {
            tx.execute("DELETE FROM note_tags WHERE note_id = ?1;", [id.as_str()])?;
            write_tags(&tx, &note.id, &note.tags)?;
        }
        tx.commit()?;
        Ok(note)
    }

    fn delete_note(&self, id: &NoteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1;", [id.as_str()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.clone()));
        }
        Ok(())
    }
}

/// Validates and inserts one note with its tags on `conn`.
///
/// Callers own the surrounding transaction.
pub(crate) fn insert_note(conn: &Connection, note: &Note) -> RepoResult<()> {
    note.validate()?;
    let inserted = conn.execute(
        "INSERT INTO notes (id, title, content, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            note.id.as_str(),
            note.title.as_str(),
            note.content.as_str(),
            note.created_at,
            note.updated_at,
        ],
    );
    match inserted {
        Ok(_) => write_tags(conn, &note.id, &note.tags),
        Err(err) if is_constraint_violation(&err) => Err(RepoError::InvalidData(format!(
            "note id already exists: {}",
            note.id
        ))),
        Err(err) => Err(err.into()),
    }
}

fn write_tags(conn: &Connection, note_id: &NoteId, tags: &[String]) -> RepoResult<()> {
    let mut stmt =
        conn.prepare("INSERT INTO note_tags (note_id, position, tag) VALUES (?1, ?2, ?3);")?;
    for (position, tag) in tags.iter().enumerate() {
        let position = i64::try_from(position)
            .map_err(|_| RepoError::InvalidData(format!("too many tags on note {note_id}")))?;
        stmt.execute(params![note_id.as_str(), position, tag.as_str()])?;
    }
    Ok(())
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}

fn get_note_with(conn: &Connection, id: &NoteId) -> RepoResult<Option<Note>> {
    let note = conn
        .query_row(
            &format!("{NOTE_SELECT_SQL} WHERE id = ?1;"),
            [id.as_str()],
            |row| Ok(parse_note_row(row)),
        )
        .optional()?
        .transpose()?;

    match note {
        Some(mut note) => {
            note.tags = load_tags_for_note(conn, &note.id)?;
            Ok(Some(note))
        }
        None => Ok(None),
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let id: String = row.get("id")?;
    let note = Note {
        id: NoteId::new(id),
        title: row.get("title")?,
        content: row.get("content")?,
        tags: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    note.validate()?;
    Ok(note)
}

fn load_tags_for_note(conn: &Connection, note_id: &NoteId) -> RepoResult<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT tag FROM note_tags WHERE note_id = ?1 ORDER BY position ASC;")?;
    let mut rows = stmt.query([note_id.as_str()])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get(0)?);
    }
    Ok(tags)
}

fn load_all_tags(conn: &Connection) -> RepoResult<HashMap<NoteId, Vec<String>>> {
    let mut stmt =
        conn.prepare("SELECT note_id, tag FROM note_tags ORDER BY note_id ASC, position ASC;")?;
    let mut rows = stmt.query([])?;
    let mut tags: HashMap<NoteId, Vec<String>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let note_id: String = row.get(0)?;
        tags.entry(NoteId::new(note_id))
            .or_default()
            .push(row.get(1)?);
    }
    Ok(tags)
}
