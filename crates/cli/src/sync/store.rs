// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable key-value storage for UTF-8 text blobs.
//!
//! The offline queue lives under a single key. [`FileStore`] keeps one file
//! per key and replaces it by writing a temporary file, fsyncing it and
//! renaming it over the old one, so a reader sees either the previous value
//! or the new one, never a torn write. Read-modify-write cycles and named
//! locks use `fs2` advisory locks, which also exclude other processes.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use fs2::FileExt;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key contains characters that cannot be used as a file name.
    #[error("invalid storage key: '{0}'")]
    InvalidKey(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Minimal get/set interface over a durable text store.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Read-modify-write `key` as one step with respect to other writers,
    /// including other processes sharing the store.
    ///
    /// `edit` receives the current value and returns the value to store. It is
    /// not called if the read fails.
    fn update(
        &self,
        key: &str,
        edit: &mut dyn FnMut(Option<String>) -> StorageResult<String>,
    ) -> StorageResult<()>;

    /// Try to take the exclusive lock `name` without blocking.
    ///
    /// `None` means another holder has it. Stores private to one process have
    /// nobody to exclude and always grant it.
    fn try_lock(&self, name: &str) -> StorageResult<Option<StoreLock>> {
        let _ = name;
        Ok(Some(StoreLock::default()))
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn update(
        &self,
        key: &str,
        edit: &mut dyn FnMut(Option<String>) -> StorageResult<String>,
    ) -> StorageResult<()> {
        (**self).update(key, edit)
    }

    fn try_lock(&self, name: &str) -> StorageResult<Option<StoreLock>> {
        (**self).try_lock(name)
    }
}

/// A held [`KeyValueStore::try_lock`] lock, released on drop.
#[derive(Default)]
pub struct StoreLock {
    file: Option<File>,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = file.unlock();
        }
    }
}

const LOCK_FILE_NAME: &str = ".lock";

/// File-backed store: each key is a file inside `dir`.
///
/// Writers take an advisory lock on `dir/.lock` for the whole read-modify-write,
/// so processes sharing a data directory never lose each other's updates.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: &Path) -> StorageResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(FileStore {
            dir: dir.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }

    fn open_lock_file(&self, file_name: &str) -> StorageResult<File> {
        Ok(OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(file_name))?)
    }

    fn lock(&self) -> StorageResult<File> {
        let file = self.open_lock_file(LOCK_FILE_NAME)?;
        file.lock_exclusive()?;
        Ok(file)
    }

    fn read(path: &Path) -> StorageResult<Option<String>> {
        match fs::read_to_string(path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write through a temp file and rename. Caller holds the write lock.
    fn replace(&self, key: &str, path: &Path, value: &str) -> StorageResult<()> {
        let tmp_path = self.dir.join(format!(".{}.tmp", key));
        let result = (|| -> StorageResult<()> {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(value.as_bytes())?;
            tmp.sync_all()?;
            fs::rename(&tmp_path, path)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Self::read(&self.path_for(key)?)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let lock = self.lock()?;
        let result = self.replace(key, &path, value);
        let _ = lock.unlock();
        result
    }

    fn update(
        &self,
        key: &str,
        edit: &mut dyn FnMut(Option<String>) -> StorageResult<String>,
    ) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let lock = self.lock()?;
        let result = Self::read(&path)
            .and_then(|current| edit(current))
            .and_then(|value| self.replace(key, &path, &value));
        let _ = lock.unlock();
        result
    }

    fn try_lock(&self, name: &str) -> StorageResult<Option<StoreLock>> {
        let file_name = format!(".{}.lock", name);
        self.path_for(name)?;
        let file = self.open_lock_file(&file_name)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(StoreLock { file: Some(file) })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for embedding and tests. Contents do not survive the process.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn update(
        &self,
        key: &str,
        edit: &mut dyn FnMut(Option<String>) -> StorageResult<String>,
    ) -> StorageResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let value = edit(entries.get(key).cloned())?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
