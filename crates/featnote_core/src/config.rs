//! Core runtime configuration.
//!
//! # Responsibility
//! - Collect bootstrap settings from environment-style key lookups.
//!
//! # Invariants
//! - Unset keys fall back to defaults; malformed values are errors, never
//!   silently replaced.

use crate::logging::default_log_level;
use crate::prefs::DEFAULT_DEBOUNCE;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const DB_PATH_KEY: &str = "FEATNOTE_DB_PATH";
pub const LOG_LEVEL_KEY: &str = "FEATNOTE_LOG_LEVEL";
pub const LOG_DIR_KEY: &str = "FEATNOTE_LOG_DIR";
pub const PREFS_DEBOUNCE_KEY: &str = "FEATNOTE_PREFS_DEBOUNCE_MS";

const DEFAULT_DB_FILE: &str = "featnote.sqlite3";

/// Configuration parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid value `{}` for {}: expected {}",
            self.value, self.key, self.expected
        )
    }
}

impl Error for ConfigError {}

/// Settings needed to boot the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub preferences_debounce: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            log_level: default_log_level().to_string(),
            log_dir: None,
            preferences_debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl CoreConfig {
    /// Reads the `FEATNOTE_*` process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(DB_PATH_KEY) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(LOG_LEVEL_KEY) {
            config.log_level = level;
        }
        config.log_dir = read(LOG_DIR_KEY).map(PathBuf::from);
        if let Some(raw) = read(PREFS_DEBOUNCE_KEY) {
            let millis = raw.parse::<u64>().map_err(|_| ConfigError {
                key: PREFS_DEBOUNCE_KEY,
                value: raw.clone(),
                expected: "milliseconds as a non-negative integer",
            })?;
            config.preferences_debounce = Duration::from_millis(millis);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, PREFS_DEBOUNCE_KEY};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_lookup_yields_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[])).expect("defaults");
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.preferences_debounce, Duration::from_millis(500));
    }

    #[test]
    fn lookup_overrides_each_key() {
        let config = CoreConfig::from_lookup(lookup(&[
            ("FEATNOTE_DB_PATH", "/tmp/notes.db"),
            ("FEATNOTE_LOG_LEVEL", "warn"),
            ("FEATNOTE_LOG_DIR", " /tmp/logs "),
            ("FEATNOTE_PREFS_DEBOUNCE_MS", "50"),
        ]))
        .expect("valid config");
        assert_eq!(config.db_path, PathBuf::from("/tmp/notes.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/logs")));
        assert_eq!(config.preferences_debounce, Duration::from_millis(50));
    }

    #[test]
    fn malformed_debounce_is_rejected() {
        let err = CoreConfig::from_lookup(lookup(&[(PREFS_DEBOUNCE_KEY, "soon")]))
            .expect_err("non-numeric debounce");
        assert_eq!(err.key, PREFS_DEBOUNCE_KEY);
        assert!(err.to_string().contains("soon"));
    }
}
