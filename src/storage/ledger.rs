// src/storage/ledger.rs
//! Pending-transfer ledger
//!
//! Metadata captured right before a token is bridged, filed under the chain the token
//! is travelling to. The whole list lives under one store key as a JSON array using
//! the same field names the web client wrote to `localStorage`, so an exported browser
//! value can be dropped into any store unchanged.
//!
//! The ledger never fails its callers: store errors are logged and the ledger behaves
//! as if it were empty. Writes are skipped whenever the stored list cannot be read.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::KeyValueStore;
use crate::core::errors::StorageError;
use crate::core::result_ext::ResultExt;

/// Store key holding the serialized list.
pub const PENDING_TRANSFERS_KEY: &str = "pendingBridgeURIs";

/// One captured metadata URI awaiting restoration on its destination chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransfer {
    #[serde(rename = "tokenId")]
    pub token_id: String,
    #[serde(rename = "uri")]
    pub metadata_uri: String,
    #[serde(rename = "sourceChain")]
    pub source_chain_id: u64,
    #[serde(rename = "destinationChain")]
    pub destination_chain_id: u64,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub captured_at: DateTime<Utc>,
}

impl PendingTransfer {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.captured_at >= ttl
    }
}

/// Time source, swappable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct PendingTransferLedger {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl std::fmt::Debug for PendingTransferLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTransferLedger").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl PendingTransferLedger {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store, clock: Arc::new(SystemClock), ttl: Duration::days(7) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Append a new entry stamped with the current time.
    pub async fn record(
        &self,
        token_id: &str,
        metadata_uri: &str,
        source_chain_id: u64,
        destination_chain_id: u64,
    ) {
        let entry = PendingTransfer {
            token_id: token_id.to_string(),
            metadata_uri: metadata_uri.to_string(),
            source_chain_id,
            destination_chain_id,
            captured_at: self.clock.now(),
        };

        // A corrupt list is replaced; an unreadable store is never written.
        let mut entries = match self.load().await {
            Ok(entries) => entries,
            Err(StorageError::Serialization(e)) => {
                warn!(token_id, "ledger value corrupt, starting a fresh list: {}", e);
                Vec::new()
            }
            Err(e) => {
                warn!(token_id, destination_chain_id, "ledger record skipped, store unreadable: {}", e);
                return;
            }
        };
        entries.push(entry);
        self.save(&entries).await.unwrap_or_log((), "ledger record");
        info!(token_id, source_chain_id, destination_chain_id, "metadata URI recorded for bridge");
    }

    /// Unexpired entries bound for `chain_id`, in insertion order.
    pub async fn list_active_for(&self, chain_id: u64) -> Vec<PendingTransfer> {
        let now = self.clock.now();
        self.load()
            .await
            .unwrap_or_log(Vec::new(), "ledger list")
            .into_iter()
            .filter(|e| e.destination_chain_id == chain_id && !e.is_expired(now, self.ttl))
            .collect()
    }

    /// Newest active entry for `token_id` on `chain_id`.
    pub async fn find_active(&self, token_id: &str, chain_id: u64) -> Option<PendingTransfer> {
        self.list_active_for(chain_id).await.into_iter().rev().find(|e| e.token_id == token_id)
    }

    /// Delete every entry for `token_id` bound for `chain_id`. Removing nothing is fine.
    pub async fn remove(&self, token_id: &str, chain_id: u64) {
        let entries = match self.load().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(token_id, chain_id, "ledger remove skipped, store unreadable: {}", e);
                return;
            }
        };

        let before = entries.len();
        let kept: Vec<PendingTransfer> = entries
            .into_iter()
            .filter(|e| !(e.token_id == token_id && e.destination_chain_id == chain_id))
            .collect();
        if kept.len() == before {
            debug!(token_id, chain_id, "ledger remove: no matching entry");
            return;
        }

        self.save(&kept).await.unwrap_or_log((), "ledger remove");
        info!(token_id, chain_id, removed = before - kept.len(), "pending transfer cleared");
    }

    /// Drop expired entries from the store; returns how many were dropped.
    pub async fn prune_expired(&self) -> usize {
        let now = self.clock.now();
        let entries = match self.load().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("ledger prune skipped, store unreadable: {}", e);
                return 0;
            }
        };

        let before = entries.len();
        let kept: Vec<PendingTransfer> =
            entries.into_iter().filter(|e| !e.is_expired(now, self.ttl)).collect();
        let dropped = before - kept.len();
        if dropped > 0 {
            self.save(&kept).await.unwrap_or_log((), "ledger prune");
            info!(dropped, "expired pending transfers pruned");
        }
        dropped
    }

    async fn load(&self) -> Result<Vec<PendingTransfer>, StorageError> {
        match self.store.get(PENDING_TRANSFERS_KEY).await? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    async fn save(&self, entries: &[PendingTransfer]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(entries)?;
        self.store.set(PENDING_TRANSFERS_KEY, &raw).await
    }
}
