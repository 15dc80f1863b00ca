//! Client-side persistence for in-flight bridge transfers.
//!
//! The ledger owns a single string key in a [`KeyValueStore`]; stores only move
//! strings around so they can be swapped (memory for tests, a JSON file or SQLite for
//! the CLI).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::core::config::{LedgerBackend, LedgerConfig};
use crate::core::errors::StorageError;

mod file;
pub mod ledger;
mod memory;
mod sqlite;

pub use file::FileStore;
pub use ledger::{Clock, PendingTransfer, PendingTransferLedger, SystemClock, PENDING_TRANSFERS_KEY};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Durable string-to-string map.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Open the store selected by `config.backend`.
pub async fn open_store(config: &LedgerConfig) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    let store: Arc<dyn KeyValueStore> = match config.backend {
        LedgerBackend::Memory => Arc::new(MemoryStore::new()),
        LedgerBackend::File => Arc::new(FileStore::new(&config.path)),
        LedgerBackend::Sqlite => Arc::new(SqliteStore::connect(&config.database_url).await?),
    };
    info!(backend = ?config.backend, "[storage] pending-transfer store opened");
    Ok(store)
}
