//! Persisted theme preference.
//!
//! [`ThemeStore`] never surfaces an error. A missing, empty, or unrecognized
//! stored value reads as `auto`; a backend that fails to read or write flips
//! the store into session-only mode, where the preference lives in memory for
//! the rest of the page view.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::preference::ThemePreference;

/// Error returned by a [`PreferenceStorage`] backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Storage is disabled, blocked, or absent in this context.
    #[error("preference storage is unavailable")]
    Unavailable,
    /// The backend refused the write (quota, private mode, ...).
    #[error("preference storage rejected the write: {0}")]
    WriteRejected(String),
}

/// A string key-value backend such as `localStorage`.
pub trait PreferenceStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Process-memory backend. Also the shape of the session fallback.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing preference parsing.
    #[must_use]
    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.entries.borrow_mut().insert(key.to_owned(), value.to_owned());
        self
    }
}

impl PreferenceStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// The one owner of the persisted preference.
pub struct ThemeStore {
    backend: Box<dyn PreferenceStorage>,
    key: String,
    session: Cell<Option<ThemePreference>>,
    degraded: Cell<bool>,
    warned_unrecognized: Cell<bool>,
}

impl ThemeStore {
    pub fn new(backend: Box<dyn PreferenceStorage>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            session: Cell::new(None),
            degraded: Cell::new(false),
            warned_unrecognized: Cell::new(false),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// True once the backend has failed and the store is session-only.
    #[must_use]
    pub fn is_session_only(&self) -> bool {
        self.degraded.get()
    }

    /// Current preference; `auto` when nothing valid is stored.
    #[must_use]
    pub fn get(&self) -> ThemePreference {
        if self.degraded.get() {
            return self.session.get().unwrap_or_default();
        }
        match self.backend.read(&self.key) {
            Ok(Some(raw)) => self.parse_stored(&raw),
            Ok(None) => ThemePreference::Auto,
            Err(err) => {
                self.degrade(&err);
                self.session.get().unwrap_or_default()
            }
        }
    }

    /// Persist `pref`. Falls back to session memory if the backend fails.
    pub fn set(&self, pref: ThemePreference) {
        self.session.set(Some(pref));
        if self.degraded.get() {
            return;
        }
        if let Err(err) = self.backend.write(&self.key, pref.as_str()) {
            self.degrade(&err);
        }
    }

    /// Advance `auto → light → dark → auto`, persist, and return the new value.
    pub fn cycle(&self) -> ThemePreference {
        let next = self.get().next();
        self.set(next);
        next
    }

    fn parse_stored(&self, raw: &str) -> ThemePreference {
        if raw.is_empty() {
            return ThemePreference::Auto;
        }
        if let Some(pref) = ThemePreference::parse(raw) {
            return pref;
        }
        if !self.warned_unrecognized.replace(true) {
            log::warn!("theme: ignoring unrecognized stored preference {raw:?} under {:?}", self.key);
        }
        ThemePreference::Auto
    }

    fn degrade(&self, err: &StorageError) {
        if !self.degraded.replace(true) {
            log::warn!("theme: {err}; keeping the preference for this page view only");
        }
    }
}

impl std::fmt::Debug for ThemeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeStore")
            .field("key", &self.key)
            .field("session", &self.session.get())
            .field("degraded", &self.degraded.get())
            .finish_non_exhaustive()
    }
}
