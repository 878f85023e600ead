//! Durable storage for the history document.

use crate::error::HistoryError;
use crate::model::HistoryStore;
use log::{debug, info, warn};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Persistent store abstraction for the whole history document.
pub trait HistoryStorage: Send + Sync {
    /// Read the stored document. Missing or malformed content yields an empty store.
    fn load(&self) -> HistoryStore;
    /// Replace the stored document with `store` in full.
    fn save(&self, store: &HistoryStore) -> Result<(), HistoryError>;
}

/// Single JSON document mapping user id to an array of entries.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Write an empty document if nothing exists at the path yet.
    pub fn ensure_exists(&self) -> Result<(), HistoryError> {
        if self.path.exists() {
            return Ok(());
        }
        info!(
            "creating empty history document (path={})",
            self.path.display()
        );
        self.save(&HistoryStore::new())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Serialize the store the way it is laid out on disk: 2-space indentation.
pub fn render_document(store: &HistoryStore) -> Result<String, HistoryError> {
    Ok(serde_json::to_string_pretty(store)?)
}

impl HistoryStorage for JsonFileStorage {
    fn load(&self) -> HistoryStore {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    "history document missing; starting empty (path={})",
                    self.path.display()
                );
                return HistoryStore::new();
            }
            Err(err) => {
                warn!(
                    "failed to read history document; starting empty (path={}, error={})",
                    self.path.display(),
                    err
                );
                return HistoryStore::new();
            }
        };
        match serde_json::from_str::<HistoryStore>(&contents) {
            Ok(store) => {
                info!(
                    "loaded history document (path={}, users={})",
                    self.path.display(),
                    store.len()
                );
                store
            }
            Err(err) => {
                warn!(
                    "history document is malformed; starting empty (path={}, error={})",
                    self.path.display(),
                    err
                );
                HistoryStore::new()
            }
        }
    }

    fn save(&self, store: &HistoryStore) -> Result<(), HistoryError> {
        let document = render_document(store)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let temp_path = self.temp_path();
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            file.write_all(document.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;
        debug!(
            "saved history document (path={}, users={}, bytes={})",
            self.path.display(),
            store.len(),
            document.len()
        );
        Ok(())
    }
}
