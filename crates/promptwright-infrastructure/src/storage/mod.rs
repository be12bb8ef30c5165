//! Storage engine: object stores, transactions and durable snapshots.

mod atomic_json;
mod database;
mod object_store;
mod schema;

pub use atomic_json::{AtomicJsonFile, StoreLock};
pub use database::{Database, DatabaseOptions, StorageBackend, Transaction, TxMode};
pub use object_store::ObjectStore;
pub use schema::{KEY_PATH, SCHEMA_VERSION, StoreName};
