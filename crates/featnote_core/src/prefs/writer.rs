//! Debounced preference persistence.

use crate::prefs::FeaturePreferences;
use crate::repo::preferences_repo::PreferencesRepository;
use log::{debug, error};
use std::time::{Duration, Instant};

/// Window inside which consecutive saves collapse to the latest one.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// What happened to one save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveDisposition {
    Written,
    /// Held back; the latest deferred value is written by the next save
    /// outside the window or by a flush.
    Deferred,
    Failed,
}

/// Write-collapsing front for a [`PreferencesRepository`].
///
/// A value still deferred when the writer is dropped is written on drop.
pub struct DebouncedPreferencesWriter<R: PreferencesRepository> {
    repo: R,
    window: Duration,
    last_write: Option<Instant>,
    pending: Option<FeaturePreferences>,
}

impl<R: PreferencesRepository> DebouncedPreferencesWriter<R> {
    pub fn new(repo: R, window: Duration) -> Self {
        Self {
            repo,
            window,
            last_write: None,
            pending: None,
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn save(&mut self, preferences: &FeaturePreferences) -> SaveDisposition {
        self.save_at(preferences, Instant::now())
    }

    /// Saves as of `now`; exposed so callers can drive time explicitly.
    pub fn save_at(&mut self, preferences: &FeaturePreferences, now: Instant) -> SaveDisposition {
        if let Some(last) = self.last_write {
            if now.saturating_duration_since(last) < self.window {
                debug!("event=prefs_save module=prefs status=skip reason=debounced");
                self.pending = Some(preferences.clone());
                return SaveDisposition::Deferred;
            }
        }
        self.pending = None;
        self.write(preferences, now)
    }

    /// Writes the deferred value if the window has elapsed at `now`.
    pub fn flush_due(&mut self, now: Instant) -> Option<SaveDisposition> {
        let due = self
            .last_write
            .map_or(true, |last| now.saturating_duration_since(last) >= self.window);
        if !due {
            return None;
        }
        let pending = self.pending.take()?;
        Some(self.write(&pending, now))
    }

    /// Writes the deferred value immediately, if any.
    pub fn flush(&mut self) -> Option<SaveDisposition> {
        let pending = self.pending.take()?;
        Some(self.write(&pending, Instant::now()))
    }

    fn write(&mut self, preferences: &FeaturePreferences, now: Instant) -> SaveDisposition {
        self.last_write = Some(now);
        match self.repo.save_preferences(preferences) {
            Ok(()) => {
                debug!(
                    "event=prefs_save module=prefs status=ok enabled_features={}",
                    preferences.enabled_features.len()
                );
                SaveDisposition::Written
            }
            Err(err) => {
                error!(
                    "event=prefs_save module=prefs status=error error_code=prefs_write_failed error={}",
                    err
                );
                SaveDisposition::Failed
            }
        }
    }
}

impl<R: PreferencesRepository> Drop for DebouncedPreferencesWriter<R> {
    fn drop(&mut self) {
        if self.pending.is_some() {
            debug!("event=prefs_save module=prefs status=start reason=drop_flush");
            self.flush();
        }
    }
}
