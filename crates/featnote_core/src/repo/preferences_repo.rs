//! Feature preferences persistence.
//!
//! Preferences are one JSON document under a fixed key. A missing document
//! yields defaults; an unreadable one is logged and also yields defaults.

use crate::prefs::FeaturePreferences;
use crate::repo::RepoResult;
use log::error;
use rusqlite::{params, Connection, OptionalExtension};

const FEATURE_PREFERENCES_KEY: &str = "feature_preferences";

/// Repository interface for feature preferences.
pub trait PreferencesRepository {
    fn load_preferences(&self) -> RepoResult<FeaturePreferences>;
    fn save_preferences(&self, preferences: &FeaturePreferences) -> RepoResult<()>;
}

/// SQLite key/value backed preferences repository.
pub struct SqlitePreferencesRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePreferencesRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PreferencesRepository for SqlitePreferencesRepository<'_> {
    fn load_preferences(&self) -> RepoResult<FeaturePreferences> {
        let stored: Option<String> = self
            .conn
            .query_row(
                "SELECT value_json FROM preferences WHERE key = ?1;",
                [FEATURE_PREFERENCES_KEY],
                |row| row.get(0),
            )
            .optional()?;

        let Some(json) = stored else {
            return Ok(FeaturePreferences::default());
        };

        match serde_json::from_str::<FeaturePreferences>(&json) {
            Ok(preferences) => Ok(preferences),
            Err(err) => {
                error!(
                    "event=prefs_load module=repo status=error error_code=prefs_corrupt error={}",
                    err
                );
                Ok(FeaturePreferences::default())
            }
        }
    }

    fn save_preferences(&self, preferences: &FeaturePreferences) -> RepoResult<()> {
        let json = serde_json::to_string(preferences)?;
        self.conn.execute(
            "INSERT INTO preferences (key, value_json, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value_json = excluded.value_json,
                updated_at = excluded.updated_at;",
            params![FEATURE_PREFERENCES_KEY, json],
        )?;
        Ok(())
    }
}
