//! Atomic JSON file operations.
//!
//! Provides the durable half of the file backend: whole-file snapshots
//! written via temp file + fsync + atomic rename, and an exclusive
//! process-level lock held for the lifetime of a connection.

use promptwright_core::error::{Result, StoreError};
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// A handle to a JSON file that is only ever replaced atomically.
///
/// Provides:
/// - **Atomicity**: Writes are all-or-nothing via tmp file + atomic rename
/// - **Durability**: Explicit fsync before rename
#[derive(Debug)]
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for AtomicJsonFile<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a new atomic JSON file handle.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let data: T = serde_json::from_str(&content)?;
        Ok(Some(data))
    }

    /// Saves data to the file atomically.
    pub fn save(&self, data: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(data)?;
        write_atomic(&self.path, &bytes)
    }
}

/// Replaces the file at `path` with `bytes` atomically.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    // Write to temporary file in the same directory
    let tmp_path = temp_path(path)?;
    let mut tmp_file = File::create(&tmp_path)?;
    tmp_file.write_all(bytes)?;

    // Ensure data is written to disk
    tmp_file.sync_all()?;
    drop(tmp_file);

    // Atomic rename
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    Ok(())
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| StoreError::io(format!("Path has no file name: {}", path.display())))?;

    let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
    Ok(path.with_file_name(tmp_name))
}

/// An exclusive advisory lock on `<path>.lock`, held until dropped.
///
/// Only one process may hold a store file open for writing at a time. The
/// lock file itself is never removed: a waiter that opened it earlier must
/// contend on the same inode as any later opener.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
}

impl StoreLock {
    /// Acquires the lock without blocking.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Locked` if another process holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        // Ensure parent directory exists
        if let Some(parent) = lock_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        use fs2::FileExt;
        file.try_lock_exclusive().map_err(|e| {
            tracing::debug!("Failed to lock {}: {}", lock_path.display(), e);
            StoreError::Locked {
                path: path.display().to_string(),
            }
        })?;

        Ok(StoreLock { file })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        use fs2::FileExt;
        let _ = self.file.unlock();
    }
}
