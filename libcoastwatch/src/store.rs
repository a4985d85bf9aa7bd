//! Persisted key-value state
//!
//! A small string-to-string map stored as TOML on disk. Multi-key writes and
//! removals happen under a single write lock and are persisted with a
//! write-to-temp-then-rename, so a reader never sees half of a multi-key
//! update, either in memory or on disk.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Result, StoreError};

/// State structure persisted to TOML
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct StoreState {
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// Thread-safe key-value store, optionally backed by a file
#[derive(Clone)]
pub struct LocalStore {
    /// Path to the state file; `None` keeps everything in memory
    path: Option<PathBuf>,
    state: Arc<RwLock<StoreState>>,
}

impl LocalStore {
    /// Open a file-backed store, loading existing state if present
    ///
    /// A file that cannot be read or parsed opens as an empty store; errors
    /// surface on the next write instead.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = Self::load(&path);
        Ok(Self {
            path: Some(path),
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// A store that never touches disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Arc::new(RwLock::new(StoreState::default())),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let state = self.read()?;
        Ok(state.entries.get(key).cloned())
    }

    /// Read several keys from one consistent snapshot
    pub fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>> {
        let state = self.read()?;
        Ok(keys
            .iter()
            .map(|key| state.entries.get(*key).cloned())
            .collect())
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    /// Set all entries together, or none of them
    pub fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut state = self.write()?;
        let mut next = state.clone();
        for (key, value) in entries {
            next.entries.insert((*key).to_string(), (*value).to_string());
        }
        self.persist(&next)?;
        *state = next;
        Ok(())
    }

    /// Remove all keys together; absent keys are not an error
    pub fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut state = self.write()?;
        if keys.iter().all(|key| !state.entries.contains_key(*key)) {
            return Ok(());
        }
        let mut next = state.clone();
        for key in keys {
            next.entries.remove(*key);
        }
        self.persist(&next)?;
        *state = next;
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| StoreError::Corrupted("state lock poisoned".to_string()).into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| StoreError::Corrupted("state lock poisoned".to_string()).into())
    }

    /// Load state from disk
    ///
    /// A missing file is an empty store. An unreadable or corrupted file is
    /// logged and treated as empty; the next write replaces it.
    fn load(path: &Path) -> StoreState {
        if !path.exists() {
            return StoreState::default();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Cannot read state file {}, using empty state: {}", path.display(), e);
                return StoreState::default();
            }
        };
        match toml::from_str::<StoreState>(&content) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Corrupted state file {}, using empty state: {}", path.display(), e);
                StoreState::default()
            }
        }
    }

    /// Poison the state lock so every later access fails
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let state = Arc::clone(&self.state);
        let _ = std::thread::spawn(move || {
            let _guard = state.write();
            panic!("poisoning store lock");
        })
        .join();
    }

    /// Write state to disk via a sibling temp file and rename
    fn persist(&self, state: &StoreState) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(StoreError::Io)?;
            }
        }

        let content = toml::to_string_pretty(state).map_err(StoreError::Serialize)?;
        let tmp_path = path.with_extension("toml.tmp");
        std::fs::write(&tmp_path, content).map_err(StoreError::Io)?;

        // The file holds the session token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&tmp_path, perms).map_err(StoreError::Io)?;
        }

        std::fs::rename(&tmp_path, path).map_err(StoreError::Io)?;
        tracing::debug!("Persisted {} entries to {}", state.entries.len(), path.display());
        Ok(())
    }
}
