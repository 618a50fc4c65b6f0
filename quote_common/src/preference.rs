//! Theme preference store.
//!
//! The preference is a single JSON blob (`primary`, `surface`, `darkMode`)
//! kept under [`STORAGE_KEY`]. Storage is an injected capability: the store
//! reads it once on `load` and rewrites the blob on every change.
//!
//! - `FileStorage` keeps a JSON object of key → blob in one file and opens the
//!   file for each operation, so no handle outlives a call.
//! - `MemoryStorage` backs tests and headless runs.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QuoteError;

/// Key under which the theme blob is stored.
pub const STORAGE_KEY: &str = "themeSettings";
/// Primary palette used when nothing valid is stored.
pub const DEFAULT_PRIMARY: &str = "blue";

/// Key/value storage for preference blobs.
pub trait PreferenceStorage {
    /// Reads the blob under `key`, `None` when absent.
    fn read(&self, key: &str) -> Result<Option<String>, QuoteError>;
    /// Writes `value` under `key`, replacing any previous blob.
    fn write(&self, key: &str, value: &str) -> Result<(), QuoteError>;
}

/// Theme settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThemePreference {
    /// Primary palette name.
    pub primary: String,
    /// Surface palette name; `None` keeps the theme default.
    pub surface: Option<String>,
    /// Dark color scheme on.
    pub dark_mode: bool,
}

impl Default for ThemePreference {
    fn default() -> Self {
        Self {
            primary: DEFAULT_PRIMARY.to_string(),
            surface: None,
            dark_mode: false,
        }
    }
}

impl ThemePreference {
    /// Decodes a stored blob field by field; anything missing or mistyped
    /// falls back to the default for that field.
    pub fn from_blob(blob: &str) -> Self {
        let defaults = Self::default();
        let value = match serde_json::from_str::<Value>(blob) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!("Stored theme settings are not a JSON object; using defaults");
                return defaults;
            }
        };

        Self {
            primary: value
                .get("primary")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or(defaults.primary),
            surface: value
                .get("surface")
                .and_then(Value::as_str)
                .map(str::to_string),
            dark_mode: value
                .get("darkMode")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.dark_mode),
        }
    }
}

/// Owns the current preference and its storage.
pub struct PreferenceStore<S: PreferenceStorage> {
    storage: S,
    current: ThemePreference,
}

impl<S: PreferenceStorage> PreferenceStore<S> {
    /// Loads the stored preference; read failures and bad data yield defaults.
    pub fn load(storage: S) -> Self {
        let current = match storage.read(STORAGE_KEY) {
            Ok(Some(blob)) => ThemePreference::from_blob(&blob),
            Ok(None) => ThemePreference::default(),
            Err(e) => {
                warn!("Failed to read theme settings: {}", e);
                ThemePreference::default()
            }
        };
        debug!("Theme settings loaded: {:?}", current);
        Self { storage, current }
    }

    /// Current preference.
    pub fn current(&self) -> &ThemePreference {
        &self.current
    }

    /// Sets the primary palette and persists.
    pub fn set_primary(&mut self, value: &str) -> Result<(), QuoteError> {
        self.current.primary = value.to_string();
        self.save()
    }

    /// Sets the surface palette and persists.
    pub fn set_surface(&mut self, value: &str) -> Result<(), QuoteError> {
        self.current.surface = Some(value.to_string());
        self.save()
    }

    /// Flips dark mode, persists, and returns the new state.
    pub fn toggle_dark_mode(&mut self) -> Result<bool, QuoteError> {
        self.current.dark_mode = !self.current.dark_mode;
        self.save()?;
        Ok(self.current.dark_mode)
    }

    fn save(&self) -> Result<(), QuoteError> {
        let blob = serde_json::to_string(&self.current)?;
        self.storage.write(STORAGE_KEY, &blob)
    }

    /// Gives the storage back, e.g. to inspect it in tests.
    pub fn into_storage(self) -> S {
        self.storage
    }
}

/// In-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Storage pre-seeded with one blob.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::default();
        if let Ok(mut entries) = storage.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        storage
    }
}

impl PreferenceStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, QuoteError> {
        Ok(self.entries.lock()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), QuoteError> {
        self.entries.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage backed by a JSON file holding an object of key → blob.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage backed by the JSON file at `path`; the file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<HashMap<String, String>, QuoteError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(HashMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(QuoteError::Io(e)),
        }
    }
}

impl PreferenceStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, QuoteError> {
        Ok(self.read_all()?.remove(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), QuoteError> {
        // A corrupt file is overwritten rather than blocking every save.
        let mut entries = self.read_all().unwrap_or_default();
        entries.insert(key.to_string(), value.to_string());
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }
}
