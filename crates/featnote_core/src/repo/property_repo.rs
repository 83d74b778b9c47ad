//! Stored property repository contract and SQLite implementation.
//!
//! # Invariants
//! - At most one row per `(note_id, feature_id)`; writes are upserts.
//! - `list_properties` returns rows in write order, so the most recent write
//!   is applied last when several features share an attribute role.
//! - Values are persisted as serialized `AttributeValue` JSON.

use crate::model::note::NoteId;
use crate::model::property::StoredProperty;
use crate::model::value::AttributeValue;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection};

/// Repository interface for stored property operations.
pub trait PropertyRepository {
    fn list_properties(&self) -> RepoResult<Vec<StoredProperty>>;
    /// Inserts or replaces the value for `(note_id, feature_id)`.
    fn put_property(&self, property: &StoredProperty) -> RepoResult<()>;
    /// Deletes every property of one note; returns how many were removed.
    fn delete_properties(&self, note_id: &NoteId) -> RepoResult<usize>;
}

/// SQLite-backed property repository.
pub struct SqlitePropertyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePropertyRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PropertyRepository for SqlitePropertyRepository<'_> {
    fn list_properties(&self) -> RepoResult<Vec<StoredProperty>> {
        let mut stmt = self.conn.prepare(
            "SELECT note_id, feature_id, value_json
             FROM note_properties
             ORDER BY seq ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut properties = Vec::new();
        while let Some(row) = rows.next()? {
            let note_id: String = row.get("note_id")?;
            let feature_id: String = row.get("feature_id")?;
            let value_json: String = row.get("value_json")?;
            let value: AttributeValue = serde_json::from_str(&value_json).map_err(|err| {
                RepoError::InvalidData(format!(
                    "property `{feature_id}` of note {note_id} has unreadable value: {err}"
                ))
            })?;
            properties.push(StoredProperty::new(NoteId::new(note_id), feature_id, value));
        }
        Ok(properties)
    }

    fn put_property(&self, property: &StoredProperty) -> RepoResult<()> {
        insert_property(self.conn, property)
    }

    fn delete_properties(&self, note_id: &NoteId) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM note_properties WHERE note_id = ?1;",
            [note_id.as_str()],
        )?;
        Ok(removed)
    }
}

pub(crate) fn insert_property(conn: &Connection, property: &StoredProperty) -> RepoResult<()> {
    let note_exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM notes WHERE id = ?1);",
        [property.note_id.as_str()],
        |row| row.get(0),
    )?;
    if note_exists != 1 {
        return Err(RepoError::NotFound(property.note_id.clone()));
    }

    let value_json = serde_json::to_string(&property.value)?;
    conn.execute(
        "INSERT INTO note_properties (note_id, feature_id, value_json, seq)
         VALUES (
            ?1,
            ?2,
            ?3,
            (SELECT COALESCE(MAX(seq), 0) + 1 FROM note_properties)
         )
         ON CONFLICT(note_id, feature_id) DO UPDATE SET
            value_json = excluded.value_json,
            seq = excluded.seq;",
        params![
            property.note_id.as_str(),
            property.feature_id.as_str(),
            value_json
        ],
    )?;
    Ok(())
}
