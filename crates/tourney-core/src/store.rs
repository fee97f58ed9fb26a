//! Persisted-state storage.
//!
//! State is kept as two independent JSON documents, one for participants
//! and one for matches, under the same keys the browser display uses. A
//! [`StateStore`] reads and writes those documents as text; parsing and
//! schema migration happen once, at load, in [`crate::migrate`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use tracing::debug;

/// Errors that can occur when reading or writing persisted state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A file could not be read, written, or renamed.
    #[error("storage I/O error on {path}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// State could not be serialized.
    #[error("failed to serialize state: {source}")]
    Serialize {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The store refused the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

/// The persisted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StorageKey {
    /// The participant collection.
    Participants,
    /// The match collection, most recent first.
    Matches,
    /// Ids of removed participants. Absent while nobody has been removed.
    Retired,
}

impl StorageKey {
    /// Every key, in write order.
    pub const ALL: [Self; 3] = [Self::Participants, Self::Matches, Self::Retired];

    /// The storage key name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Participants => "championship_participants",
            Self::Matches => "championship_games",
            Self::Retired => "championship_retired",
        }
    }
}

impl core::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key-value store for the persisted records.
///
/// Implementations only move text; they never interpret it.
pub trait StateStore {
    /// Read the document stored under `key`, `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn read(&self, key: StorageKey) -> Result<Option<String>, StoreError>;

    /// Replace the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be written.
    fn write(&self, key: StorageKey, document: &str) -> Result<(), StoreError>;

    /// Remove the document stored under `key`. Removing a missing key is
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be written.
    fn remove(&self, key: StorageKey) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// JSON files
// ---------------------------------------------------------------------------

/// One `<key>.json` file per record inside a data directory.
///
/// Writes go to a temporary file that is renamed over the target, so a
/// reader never sees a half-written document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`. The directory is created on first
    /// write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Latest modification time across both files, `None` if neither
    /// exists. Used to notice writes made by another process.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if file metadata cannot be read.
    pub fn last_modified(&self) -> Result<Option<SystemTime>, StoreError> {
        let mut latest = None;
        for key in StorageKey::ALL {
            let path = self.path_for(key);
            if !path.exists() {
                continue;
            }
            let modified = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .map_err(|source| StoreError::Io { path, source })?;
            latest = latest.max(Some(modified));
        }
        Ok(latest)
    }
}

impl StateStore for JsonFileStore {
    fn read(&self, key: StorageKey) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(document) => Ok(Some(document)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn write(&self, key: StorageKey, document: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&tmp, document).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), bytes = document.len(), "Record written");
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

/// In-memory store for tests and embedding.
///
/// Clones share the same documents, so two engines built over clones of
/// one store behave like two views of the same persisted state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<BTreeMap<StorageKey, String>>>,
    reject_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail (or succeed again).
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable {
            message: String::from("memory store lock poisoned"),
        }
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                message: String::from("writes rejected"),
            });
        }
        Ok(())
    }
}

impl StateStore for MemoryStore {
    fn read(&self, key: StorageKey) -> Result<Option<String>, StoreError> {
        let documents = self.documents.read().map_err(|_poison| Self::poisoned())?;
        Ok(documents.get(&key).cloned())
    }

    fn write(&self, key: StorageKey, document: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut documents = self.documents.write().map_err(|_poison| Self::poisoned())?;
        documents.insert(key, document.to_owned());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut documents = self.documents.write().map_err(|_poison| Self::poisoned())?;
        documents.remove(&key);
        Ok(())
    }
}
