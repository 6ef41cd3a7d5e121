//! # Local Store
//!
//! A small string key/value store standing in for per-browser local
//! storage. Two keys families live here: the theme preference and one
//! saved-progress snapshot per form kind.
//!
//! Callers never see a storage failure as a hard error. Progress operations
//! report a [`SaveStatus`]; the theme store logs and carries on.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use crate::error::FormsError;
use crate::model::{FormDraft, FormKind};

pub const THEME_KEY: &str = "tcc-forms-theme";

/// Key holding the saved progress of one form kind.
pub fn progress_key(kind: FormKind) -> String {
    format!("tcc_form_{}", kind)
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, FormsError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), FormsError>;
    fn remove(&mut self, key: &str) -> Result<(), FormsError>;
}

/// Volatile store, used by tests and as a fallback when no data directory
/// is usable.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail, like a full quota.
    pub fn read_only() -> Self {
        MemoryStore {
            entries: BTreeMap::new(),
            read_only: true,
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, FormsError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), FormsError> {
        if self.read_only {
            return Err(FormsError::StorageError("store is read-only".to_string()));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), FormsError> {
        if self.read_only {
            return Err(FormsError::StorageError("store is read-only".to_string()));
        }
        self.entries.remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten on every change.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub const FILE_NAME: &'static str = "local-storage.json";

    pub fn in_dir(dir: &Path) -> Self {
        FileStore {
            path: dir.join(Self::FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, FormsError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                FormsError::StorageError(format!("{} is corrupt: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(FormsError::StorageError(format!(
                "cannot read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), FormsError> {
        let storage_err =
            |e: std::io::Error| FormsError::StorageError(format!("cannot write {}: {}", self.path.display(), e));
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(storage_err)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json).map_err(storage_err)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, FormsError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), FormsError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), FormsError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Outcome of a save/load action, as shown next to the buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Error,
}

/// Write the draft as the progress snapshot for its kind.
pub fn save_progress(store: &mut dyn KeyValueStore, draft: &FormDraft) -> SaveStatus {
    let result = serde_json::to_string(draft)
        .map_err(FormsError::from)
        .and_then(|json| store.set(&progress_key(draft.kind), &json));
    match result {
        Ok(()) => SaveStatus::Saved,
        Err(e) => {
            warn!("Failed to save progress for {}: {}", draft.kind, e);
            SaveStatus::Error
        }
    }
}

/// Read the progress snapshot for a kind. A missing or unreadable snapshot
/// is reported as `Error` with no draft.
pub fn load_progress(store: &dyn KeyValueStore, kind: FormKind) -> (SaveStatus, Option<FormDraft>) {
    let raw = match store.get(&progress_key(kind)) {
        Ok(Some(raw)) => raw,
        Ok(None) => return (SaveStatus::Error, None),
        Err(e) => {
            warn!("Failed to load progress for {}: {}", kind, e);
            return (SaveStatus::Error, None);
        }
    };
    match serde_json::from_str::<FormDraft>(&raw) {
        Ok(draft) if draft.kind == kind => (SaveStatus::Saved, Some(draft)),
        Ok(draft) => {
            warn!("Progress under {} belongs to {}", kind, draft.kind);
            (SaveStatus::Error, None)
        }
        Err(e) => {
            warn!("Saved progress for {} is unreadable: {}", kind, e);
            (SaveStatus::Error, None)
        }
    }
}
