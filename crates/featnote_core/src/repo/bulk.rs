//! Bulk replacement used by the import collaborator.

use crate::model::note::Note;
use crate::model::property::StoredProperty;
use crate::repo::note_repo::insert_note;
use crate::repo::property_repo::insert_property;
use crate::repo::RepoResult;
use log::info;
use rusqlite::Connection;

/// Replaces every note and stored property in one transaction.
///
/// Either the whole data set is swapped or nothing changes.
pub fn replace_all(
    conn: &Connection,
    notes: &[Note],
    properties: &[StoredProperty],
) -> RepoResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "DELETE FROM note_properties;
         DELETE FROM note_tags;
         DELETE FROM notes;",
    )?;

    for note in notes {
        insert_note(&tx, note)?;
    }
    for property in properties {
        insert_property(&tx, property)?;
    }

    tx.commit()?;
    info!(
        "event=bulk_replace module=repo status=ok notes={} properties={}",
        notes.len(),
        properties.len()
    );
    Ok(())
}
