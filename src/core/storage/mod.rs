use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, info};

/// Durable key-value slot backing the counters. Keys are counter names.
pub trait KvStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;
    fn list(&self) -> Result<Vec<String>, StorageError>;
}

/// Runs a storage call on the blocking pool so file I/O never stalls a runtime worker.
pub async fn run_blocking<T, F>(storage: &Arc<dyn KvStorage>, call: F) -> Result<T, StorageError>
where
    T: Send + 'static,
    F: FnOnce(&dyn KvStorage) -> Result<T, StorageError> + Send + 'static,
{
    let storage = storage.clone();
    tokio::task::spawn_blocking(move || call(storage.as_ref()))
        .await
        .map_err(|err| StorageError::InternalError {
            description: format!("storage task failed: {err:?}"),
        })?
}

#[derive(Error, Debug)]
pub enum StorageError {
    /// Storage operation failed because of internal error in storage implementation.
    #[error("internal storage error: {description}")]
    InternalError { description: String },

    /// Key violates one of the constraints set by this storage backend.
    #[error("key '{key}' rejected by storage backend: {description}")]
    KeyConstraintError { key: String, description: String },
}

#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, StorageError> {
        self.entries.lock().map_err(|err| StorageError::InternalError {
            description: format!("failed to acquire memory storage lock: {err:?}"),
        })
    }
}

impl KvStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.entries()?.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self.entries()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// One file per key inside a data directory.
#[derive(Clone, Debug)]
pub struct FsStorage {
    path: PathBuf,
}

impl FsStorage {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        fs::create_dir_all(&path).map_err(|err| StorageError::InternalError {
            description: format!("failed to create directory {}: {err:?}", path.display()),
        })?;
        info!("Filesystem storage opened at {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn path_for_key(&self, key: &str) -> Result<PathBuf, StorageError> {
        let reject = |description: &str| StorageError::KeyConstraintError {
            key: key.to_owned(),
            description: description.to_owned(),
        };

        if key.is_empty() {
            return Err(reject("key must not be empty"));
        }
        // dot-prefixed names are reserved for staging files
        if key.starts_with('.') {
            return Err(reject("key must not start with '.'"));
        }
        if key.contains(['/', '\\', '\0']) {
            return Err(reject("key must not contain path separators or NUL"));
        }

        Ok(self.path.join(key))
    }
}

impl KvStorage for FsStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.path_for_key(key)?) {
            Ok(v) => Ok(Some(v)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::InternalError {
                description: format!("failed to read file for key '{key}': {err:?}"),
            }),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for_key(key)?;
        // fsync before rename: readers only ever see a complete record
        let staging = self.path.join(format!(".{key}.tmp"));
        let write_staging = || -> io::Result<()> {
            let mut file = fs::File::create(&staging)?;
            file.write_all(value)?;
            file.sync_all()
        };
        write_staging().map_err(|err| StorageError::InternalError {
            description: format!("failed to write file for key '{key}': {err:?}"),
        })?;
        fs::rename(&staging, &path).map_err(|err| StorageError::InternalError {
            description: format!("failed to move file into place for key '{key}': {err:?}"),
        })?;
        debug!("Stored {} bytes under key '{}'", value.len(), key);
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, StorageError> {
        let entries = fs::read_dir(&self.path).map_err(|err| StorageError::InternalError {
            description: format!("failed to list {}: {err:?}", self.path.display()),
        })?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| StorageError::InternalError {
                description: format!("failed to read directory entry: {err:?}"),
            })?;
            if !entry.path().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    keys.push(name.to_owned());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
