//! Persistent user preferences.
//!
//! The host application keeps small per-user option values (the log level
//! among them) in its own preference store. [`OptionStore`] abstracts that
//! store so the level hook works the same against the real host bridge, a
//! JSON file, or an in-memory table in tests.

pub mod hook;

pub use hook::{apply_initial_level_preference, DirectLevelSetter, PreferenceLevelSetter, SetLevel};

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure while talking to a preference store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend cannot take writes right now, e.g. the host's preference
    /// system has not finished initializing.
    #[error("preference store unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read preferences {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write preferences {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed preferences {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// String-keyed option storage.
///
/// Reads are best-effort and never fail; a missing or unreadable backend
/// just yields `None`. Writes report their failure so callers can decide
/// how loudly to complain.
pub trait OptionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Volatile store for tests and for hosts without preference support.
#[derive(Debug, Default)]
pub struct MemoryOptionStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryOptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptionStore for MemoryOptionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap_or_else(|e| e.into_inner()).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// On-disk layout of [`FileOptionStore`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct PrefFile {
    #[serde(default)]
    options: BTreeMap<String, String>,
}

/// Options persisted as a small JSON document.
///
/// Every operation re-reads the file, so several runtimes sharing one
/// preference file see each other's writes. Writes are whole-file
/// replacements.
#[derive(Debug, Clone)]
pub struct FileOptionStore {
    path: PathBuf,
}

impl FileOptionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_doc(&self) -> Result<PrefFile, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|source| StoreError::Malformed { path: self.path.clone(), source }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(PrefFile::default()),
            Err(source) => Err(StoreError::Read { path: self.path.clone(), source }),
        }
    }
}

impl OptionStore for FileOptionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_doc().ok().and_then(|doc| doc.options.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut doc = self.read_doc()?;
        doc.options.insert(key.to_string(), value.to_string());
        let text = serde_json::to_string_pretty(&doc)
            .map_err(|source| StoreError::Malformed { path: self.path.clone(), source })?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| StoreError::Write { path: self.path.clone(), source })?;
        }
        fs::write(&self.path, text)
            .map_err(|source| StoreError::Write { path: self.path.clone(), source })
    }
}
