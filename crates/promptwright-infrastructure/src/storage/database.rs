//! Transactional engine over the object stores.
//!
//! A [`Database`] is an explicitly opened connection that every repository
//! shares by cloning the handle. All record access goes through
//! [`Database::with_store`] / [`Database::with_stores`], which scope a
//! [`Transaction`] to a set of stores and resolve only once it has committed.
//!
//! Read-only transactions share a read lock over the live stores.
//! Read-write transactions take the write lock, run against copies of the
//! scoped stores, persist the resulting snapshot and only then swap the
//! copies in. A transaction body that returns an error, or a snapshot that
//! fails to persist, leaves nothing visible.
//!
//! Persist-and-swap runs on a spawned task that owns the write lock, so a
//! caller that stops waiting cannot leave the file ahead of the live view.

use super::atomic_json::{AtomicJsonFile, StoreLock};
use super::object_store::ObjectStore;
use super::schema::{SCHEMA_VERSION, StoreName};
use promptwright_core::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

/// Access mode of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    ReadOnly,
    ReadWrite,
}

/// Where committed data lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local; everything is lost on close.
    Memory,
    /// A single JSON snapshot file, locked for the life of the connection.
    File { path: PathBuf },
}

/// Options for [`Database::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseOptions {
    pub backend: StorageBackend,
}

impl DatabaseOptions {
    pub fn memory() -> Self {
        Self {
            backend: StorageBackend::Memory,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: StorageBackend::File { path: path.into() },
        }
    }
}

/// On-disk layout of the file backend.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    format_version: u32,
    #[serde(default)]
    stores: BTreeMap<String, Vec<Value>>,
}

enum Persistence {
    Memory,
    File {
        file: AtomicJsonFile<Snapshot>,
        _lock: StoreLock,
    },
}

struct Connection {
    stores: BTreeMap<StoreName, ObjectStore>,
    persistence: Persistence,
}

impl Connection {
    /// Writes the snapshot that results from applying `changed` on top of
    /// the live stores.
    async fn persist(&self, changed: &BTreeMap<StoreName, ObjectStore>) -> Result<()> {
        let file = match &self.persistence {
            Persistence::Memory => return Ok(()),
            Persistence::File { file, .. } => file.clone(),
        };

        let mut snapshot = Snapshot {
            format_version: SCHEMA_VERSION,
            stores: BTreeMap::new(),
        };
        for name in StoreName::ALL {
            let store = changed.get(&name).or_else(|| self.stores.get(&name));
            let records = store
                .map(|s| s.values().cloned().collect())
                .unwrap_or_default();
            snapshot.stores.insert(name.as_str().to_string(), records);
        }

        tokio::task::spawn_blocking(move || file.save(&snapshot))
            .await
            .map_err(|e| StoreError::internal(format!("Failed to join persist task: {}", e)))?
    }
}

/// Handle to an open store.
///
/// Cloning is cheap and every clone shares the same connection.
#[derive(Clone)]
pub struct Database {
    inner: Arc<RwLock<Option<Connection>>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Opens a connection.
    ///
    /// For the file backend this takes the process lock, loads the snapshot
    /// if one exists and rebuilds every index. Stores absent from the file
    /// are created empty.
    ///
    /// # Errors
    ///
    /// - `StoreError::Locked` if another process holds the file
    /// - `StoreError::Serialization` if the snapshot can't be parsed
    /// - `StoreError::Engine` if the snapshot was written by a newer layout
    pub async fn open(options: DatabaseOptions) -> Result<Self> {
        let (snapshot, persistence) = match options.backend {
            StorageBackend::Memory => (Snapshot::default(), Persistence::Memory),
            StorageBackend::File { path } => {
                let lock = StoreLock::acquire(&path)?;
                let file = AtomicJsonFile::<Snapshot>::new(path);
                let loader = file.clone();
                let snapshot = tokio::task::spawn_blocking(move || loader.load())
                    .await
                    .map_err(|e| StoreError::internal(format!("Failed to join load task: {}", e)))??
                    .unwrap_or_default();
                (snapshot, Persistence::File { file, _lock: lock })
            }
        };

        if snapshot.format_version > SCHEMA_VERSION {
            return Err(StoreError::engine(format!(
                "store layout version {} is newer than supported version {}",
                snapshot.format_version, SCHEMA_VERSION
            )));
        }

        let mut stores: BTreeMap<StoreName, ObjectStore> = StoreName::ALL
            .into_iter()
            .map(|name| (name, ObjectStore::new(name)))
            .collect();
        for (key, records) in snapshot.stores {
            match StoreName::parse(&key) {
                Some(name) => {
                    stores.insert(name, ObjectStore::from_records(name, records));
                }
                None => tracing::warn!("Ignoring unknown store '{}' in snapshot", key),
            }
        }

        match &persistence {
            Persistence::Memory => tracing::info!("Opened in-memory store"),
            Persistence::File { file, .. } => {
                tracing::info!("Opened store file {}", file.path().display())
            }
        }

        Ok(Self {
            inner: Arc::new(RwLock::new(Some(Connection {
                stores,
                persistence,
            }))),
        })
    }

    /// Opens a fresh in-memory store.
    pub async fn open_in_memory() -> Result<Self> {
        Self::open(DatabaseOptions::memory()).await
    }

    /// Closes the connection and releases the file lock.
    ///
    /// Waits for in-flight transactions. Every later call on any clone of
    /// this handle fails with an engine error. Closing twice is a no-op.
    pub async fn close(&self) {
        let mut guard = self.inner.write().await;
        if guard.take().is_some() {
            tracing::info!("Closed store");
        }
    }

    pub async fn is_open(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Runs `f` in a transaction scoped to a single store.
    pub async fn with_store<T, F>(&self, store: StoreName, mode: TxMode, f: F) -> Result<T>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T> + Send,
        T: Send,
    {
        self.with_stores(&[store], mode, f).await
    }

    /// Runs `f` in a transaction scoped to `stores`.
    ///
    /// Resolves once the transaction has committed. If `f` returns an error
    /// the transaction aborts and none of its writes become visible.
    pub async fn with_stores<T, F>(&self, stores: &[StoreName], mode: TxMode, f: F) -> Result<T>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T> + Send,
        T: Send,
    {
        match mode {
            TxMode::ReadOnly => {
                let guard = self.inner.read().await;
                let connection = guard.as_ref().ok_or_else(closed)?;
                let mut tx = Transaction {
                    scope: stores,
                    view: TxView::Read(&connection.stores),
                    writes: 0,
                };
                f(&mut tx)
            }
            TxMode::ReadWrite => {
                let guard = self.inner.clone().write_owned().await;
                let connection = guard.as_ref().ok_or_else(closed)?;

                let mut working = BTreeMap::new();
                for name in stores {
                    let store = connection
                        .stores
                        .get(name)
                        .ok_or_else(|| StoreError::engine(format!("unknown store '{}'", name)))?;
                    working.insert(*name, store.clone());
                }

                let (value, writes) = {
                    let mut tx = Transaction {
                        scope: stores,
                        view: TxView::Write(&mut working),
                        writes: 0,
                    };
                    match f(&mut tx) {
                        Ok(value) => (value, tx.writes),
                        Err(e) => {
                            tracing::debug!(?stores, "Transaction aborted: {}", e);
                            return Err(e);
                        }
                    }
                };

                if writes > 0 {
                    tokio::spawn(commit(guard, working))
                        .await
                        .map_err(|e| {
                            StoreError::internal(format!("Failed to join commit task: {}", e))
                        })??;
                }
                tracing::debug!(?stores, writes, "Transaction committed");
                Ok(value)
            }
        }
    }
}

/// Persists `working` and swaps it into the live stores.
///
/// Runs to completion even if the transaction's caller is dropped.
async fn commit(
    mut guard: OwnedRwLockWriteGuard<Option<Connection>>,
    working: BTreeMap<StoreName, ObjectStore>,
) -> Result<()> {
    let connection = guard.as_mut().ok_or_else(closed)?;
    connection.persist(&working).await?;
    connection.stores.extend(working);
    Ok(())
}

fn closed() -> StoreError {
    StoreError::engine("store connection is closed")
}

enum TxView<'a> {
    Read(&'a BTreeMap<StoreName, ObjectStore>),
    Write(&'a mut BTreeMap<StoreName, ObjectStore>),
}

/// A transaction scoped to a fixed set of stores.
///
/// Reads return owned copies of records; writes are staged until the
/// enclosing [`Database::with_stores`] call commits.
pub struct Transaction<'a> {
    scope: &'a [StoreName],
    view: TxView<'a>,
    writes: usize,
}

impl Transaction<'_> {
    /// Looks up a record by primary key.
    pub fn get(&self, store: StoreName, key: &str) -> Result<Option<Value>> {
        Ok(self.store(store)?.get(key).cloned())
    }

    /// All records of a store, in key order.
    pub fn get_all(&self, store: StoreName) -> Result<Vec<Value>> {
        Ok(self.store(store)?.values().cloned().collect())
    }

    /// Records whose indexed field equals `value`.
    pub fn get_all_by_index(&self, store: StoreName, index: &str, value: &str) -> Result<Vec<Value>> {
        Ok(self
            .store(store)?
            .values_by_index(index, value)?
            .into_iter()
            .cloned()
            .collect())
    }

    /// Primary keys of records whose indexed field equals `value`.
    pub fn get_all_keys_by_index(
        &self,
        store: StoreName,
        index: &str,
        value: &str,
    ) -> Result<Vec<String>> {
        self.store(store)?.keys_by_index(index, value)
    }

    pub fn count_by_index(&self, store: StoreName, index: &str, value: &str) -> Result<usize> {
        Ok(self.store(store)?.keys_by_index(index, value)?.len())
    }

    /// Inserts or replaces a record.
    pub fn put<R: Serialize>(&mut self, store: StoreName, record: &R) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.put_value(store, value)
    }

    pub fn put_value(&mut self, store: StoreName, value: Value) -> Result<()> {
        self.store_mut(store)?.put(value)?;
        self.writes += 1;
        Ok(())
    }

    /// Deletes a record. Returns whether it existed.
    pub fn delete(&mut self, store: StoreName, key: &str) -> Result<bool> {
        let existed = self.store_mut(store)?.delete(key);
        if existed {
            self.writes += 1;
        }
        Ok(existed)
    }

    fn check_scope(&self, store: StoreName) -> Result<()> {
        if self.scope.contains(&store) {
            Ok(())
        } else {
            Err(StoreError::engine(format!(
                "store '{}' is not in the transaction scope",
                store
            )))
        }
    }

    fn store(&self, store: StoreName) -> Result<&ObjectStore> {
        self.check_scope(store)?;
        let stores = match &self.view {
            TxView::Read(stores) => &**stores,
            TxView::Write(stores) => &**stores,
        };
        stores
            .get(&store)
            .ok_or_else(|| StoreError::engine(format!("unknown store '{}'", store)))
    }

    fn store_mut(&mut self, store: StoreName) -> Result<&mut ObjectStore> {
        self.check_scope(store)?;
        match &mut self.view {
            TxView::Read(_) => Err(StoreError::engine(format!(
                "cannot write to '{}' in a read-only transaction",
                store
            ))),
            TxView::Write(stores) => stores
                .get_mut(&store)
                .ok_or_else(|| StoreError::engine(format!("unknown store '{}'", store))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_read() {
        let db = Database::open_in_memory().await.unwrap();

        db.with_store(StoreName::Projects, TxMode::ReadWrite, |tx| {
            tx.put_value(StoreName::Projects, json!({"id": "p1", "name": "Demo"}))
        })
        .await
        .unwrap();

        let loaded = db
            .with_store(StoreName::Projects, TxMode::ReadOnly, |tx| {
                tx.get(StoreName::Projects, "p1")
            })
            .await
            .unwrap();
        assert_eq!(loaded.unwrap()["name"], "Demo");
    }

    #[tokio::test]
    async fn test_failed_transaction_leaves_no_writes() {
        let db = Database::open_in_memory().await.unwrap();

        let result: Result<()> = db
            .with_stores(
                &[StoreName::Projects, StoreName::Sessions],
                TxMode::ReadWrite,
                |tx| {
                    tx.put_value(StoreName::Projects, json!({"id": "p1", "name": "Demo"}))?;
                    tx.put_value(
                        StoreName::Sessions,
                        json!({"id": "s1", "project_id": "p1"}),
                    )?;
                    Err(StoreError::invalid_input("abort after writes"))
                },
            )
            .await;
        assert!(result.unwrap_err().is_invalid_input());

        let counts = db
            .with_stores(
                &[StoreName::Projects, StoreName::Sessions],
                TxMode::ReadOnly,
                |tx| {
                    Ok((
                        tx.get_all(StoreName::Projects)?.len(),
                        tx.get_all(StoreName::Sessions)?.len(),
                    ))
                },
            )
            .await
            .unwrap();
        assert_eq!(counts, (0, 0));
    }

    #[tokio::test]
    async fn test_scope_is_enforced() {
        let db = Database::open_in_memory().await.unwrap();

        let err = db
            .with_store(StoreName::Projects, TxMode::ReadOnly, |tx| {
                tx.get(StoreName::Sessions, "s1")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Engine(_)));
    }

    #[tokio::test]
    async fn test_read_only_transaction_rejects_writes() {
        let db = Database::open_in_memory().await.unwrap();

        let err = db
            .with_store(StoreName::Projects, TxMode::ReadOnly, |tx| {
                tx.put_value(StoreName::Projects, json!({"id": "p1"}))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Engine(_)));
    }

    #[tokio::test]
    async fn test_index_queries_inside_transaction() {
        let db = Database::open_in_memory().await.unwrap();

        db.with_store(StoreName::ArtifactSessions, TxMode::ReadWrite, |tx| {
            tx.put_value(
                StoreName::ArtifactSessions,
                json!({"id": "x1", "artifact_id": "a1", "project_id": "p1"}),
            )?;
            tx.put_value(
                StoreName::ArtifactSessions,
                json!({"id": "x2", "artifact_id": "a2", "project_id": "p1"}),
            )?;
            // Staged writes are visible to later reads in the same transaction
            assert_eq!(
                tx.count_by_index(StoreName::ArtifactSessions, "project_id", "p1")?,
                2
            );
            Ok(())
        })
        .await
        .unwrap();

        let keys = db
            .with_store(StoreName::ArtifactSessions, TxMode::ReadOnly, |tx| {
                tx.get_all_keys_by_index(StoreName::ArtifactSessions, "artifact_id", "a2")
            })
            .await
            .unwrap();
        assert_eq!(keys, vec!["x2"]);
    }

    #[tokio::test]
    async fn test_closed_database_rejects_transactions() {
        let db = Database::open_in_memory().await.unwrap();
        let other_handle = db.clone();
        db.close().await;

        assert!(!other_handle.is_open().await);
        let err = other_handle
            .with_store(StoreName::Projects, TxMode::ReadOnly, |tx| {
                tx.get_all(StoreName::Projects)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Engine(_)));
    }

    #[tokio::test]
    async fn test_file_backend_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");

        let db = Database::open(DatabaseOptions::file(&path)).await.unwrap();
        db.with_stores(
            &[StoreName::Projects, StoreName::Sessions],
            TxMode::ReadWrite,
            |tx| {
                tx.put_value(StoreName::Projects, json!({"id": "p1", "name": "Demo"}))?;
                tx.put_value(StoreName::Sessions, json!({"id": "s1", "project_id": "p1"}))
            },
        )
        .await
        .unwrap();
        db.close().await;

        let reopened = Database::open(DatabaseOptions::file(&path)).await.unwrap();
        let keys = reopened
            .with_store(StoreName::Sessions, TxMode::ReadOnly, |tx| {
                tx.get_all_keys_by_index(StoreName::Sessions, "project_id", "p1")
            })
            .await
            .unwrap();
        assert_eq!(keys, vec!["s1"]);
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_no_writes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        let db = Database::open(DatabaseOptions::file(&path)).await.unwrap();

        // A directory squatting on the temp path makes the snapshot write fail
        let blocker = temp_dir.path().join(".store.json.tmp");
        std::fs::create_dir(&blocker).unwrap();

        let err = db
            .with_store(StoreName::Projects, TxMode::ReadWrite, |tx| {
                tx.put_value(StoreName::Projects, json!({"id": "p1", "name": "Demo"}))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));

        let loaded = db
            .with_store(StoreName::Projects, TxMode::ReadOnly, |tx| {
                tx.get(StoreName::Projects, "p1")
            })
            .await
            .unwrap();
        assert!(loaded.is_none());
        assert!(!path.exists());

        std::fs::remove_dir(&blocker).unwrap();
        db.with_store(StoreName::Projects, TxMode::ReadWrite, |tx| {
            tx.put_value(StoreName::Projects, json!({"id": "p2", "name": "Retry"}))
        })
        .await
        .unwrap();
        let keys = db
            .with_store(StoreName::Projects, TxMode::ReadOnly, |tx| {
                Ok(tx
                    .get_all(StoreName::Projects)?
                    .into_iter()
                    .filter_map(|record| record["id"].as_str().map(str::to_string))
                    .collect::<Vec<_>>())
            })
            .await
            .unwrap();
        assert_eq!(keys, vec!["p2"]);
    }

    #[tokio::test]
    async fn test_dropped_caller_does_not_split_commit() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        let db = Database::open(DatabaseOptions::file(&path)).await.unwrap();

        let dropped_while_pending = tokio::select! {
            biased;
            _ = db.with_store(StoreName::Projects, TxMode::ReadWrite, |tx| {
                tx.put_value(StoreName::Projects, json!({"id": "p1", "name": "Demo"}))
            }) => false,
            _ = async {} => true,
        };
        assert!(dropped_while_pending);

        let live = db
            .with_store(StoreName::Projects, TxMode::ReadOnly, |tx| {
                tx.get(StoreName::Projects, "p1")
            })
            .await
            .unwrap();
        assert!(live.is_some());
        db.close().await;

        let reopened = Database::open(DatabaseOptions::file(&path)).await.unwrap();
        let on_disk = reopened
            .with_store(StoreName::Projects, TxMode::ReadOnly, |tx| {
                tx.get(StoreName::Projects, "p1")
            })
            .await
            .unwrap();
        assert!(on_disk.is_some());
    }

    #[tokio::test]
    async fn test_file_backend_is_single_writer() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");

        let first = Database::open(DatabaseOptions::file(&path)).await.unwrap();
        let err = Database::open(DatabaseOptions::file(&path)).await.unwrap_err();
        assert!(matches!(err, StoreError::Locked { .. }));

        first.close().await;
        assert!(Database::open(DatabaseOptions::file(&path)).await.is_ok());
    }

    #[tokio::test]
    async fn test_newer_layout_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, r#"{"format_version": 99, "stores": {}}"#).unwrap();

        let err = Database::open(DatabaseOptions::file(&path)).await.unwrap_err();
        assert!(matches!(err, StoreError::Engine(_)));
    }
}
