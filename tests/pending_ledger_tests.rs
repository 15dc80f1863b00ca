// tests/pending_ledger_tests.rs
//! Pending-transfer ledger: expiry, chain scoping, removal and store backends

mod util;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use mintx_bridge::core::errors::StorageError;
use mintx_bridge::core::config::{LedgerBackend, LedgerConfig};
use mintx_bridge::storage::{
    open_store, FileStore, KeyValueStore, MemoryStore, PendingTransfer, PendingTransferLedger,
    SqliteStore, PENDING_TRANSFERS_KEY,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tempfile::tempdir;
use util::{ManualClock, FUJI, SEPOLIA};

fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(fut)
}

async fn seeded(entries: &[PendingTransfer]) -> PendingTransferLedger {
    let store = Arc::new(MemoryStore::new());
    store.set(PENDING_TRANSFERS_KEY, &serde_json::to_string(entries).unwrap()).await.unwrap();
    PendingTransferLedger::new(store)
}

/// Memory store whose next `failing_reads` reads report a locked database.
#[derive(Default)]
struct LockedReadStore {
    inner: MemoryStore,
    failing_reads: AtomicU32,
}

impl LockedReadStore {
    fn fail_next_reads(&self, n: u32) {
        self.failing_reads.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for LockedReadStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let locked = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if locked {
            return Err(StorageError::Database("database is locked".into()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value).await
    }
}

fn entry(token_id: &str, destination: u64, age: Duration) -> PendingTransfer {
    PendingTransfer {
        token_id: token_id.to_string(),
        metadata_uri: format!("ipfs://{}", token_id),
        source_chain_id: if destination == FUJI { SEPOLIA } else { FUJI },
        destination_chain_id: destination,
        captured_at: Utc::now() - age,
    }
}

#[tokio::test]
async fn test_eight_day_old_entry_is_inactive() {
    let ledger = seeded(&[entry("7", FUJI, Duration::days(8))]).await;
    assert!(ledger.list_active_for(FUJI).await.is_empty());
    assert!(ledger.find_active("7", FUJI).await.is_none());
}

#[tokio::test]
async fn test_entry_expires_as_clock_moves() {
    let clock = ManualClock::new(Utc::now());
    let ledger =
        PendingTransferLedger::new(Arc::new(MemoryStore::new())).with_clock(clock.clone());
    ledger.record("7", "ipfs://abc", SEPOLIA, FUJI).await;

    clock.advance(Duration::days(6));
    assert_eq!(ledger.list_active_for(FUJI).await.len(), 1);
    clock.advance(Duration::days(1));
    assert!(ledger.list_active_for(FUJI).await.is_empty());
}

#[tokio::test]
async fn test_prune_drops_only_expired() {
    let ledger = seeded(&[
        entry("1", FUJI, Duration::days(9)),
        entry("2", FUJI, Duration::hours(1)),
        entry("3", SEPOLIA, Duration::days(30)),
    ])
    .await;

    assert_eq!(ledger.prune_expired().await, 2);
    assert_eq!(ledger.prune_expired().await, 0);
    let active = ledger.list_active_for(FUJI).await;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].token_id, "2");
}

#[tokio::test]
async fn test_remove_scoped_to_chain() {
    let ledger = seeded(&[entry("7", FUJI, Duration::zero()), entry("7", SEPOLIA, Duration::zero())])
        .await;

    ledger.remove("7", FUJI).await;

    assert!(ledger.list_active_for(FUJI).await.is_empty());
    assert_eq!(ledger.list_active_for(SEPOLIA).await.len(), 1);
}

#[tokio::test]
async fn test_corrupt_store_reads_empty_and_recovers() {
    let store = Arc::new(MemoryStore::new());
    store.set(PENDING_TRANSFERS_KEY, "{not json").await.unwrap();
    let ledger = PendingTransferLedger::new(store.clone());

    assert!(ledger.list_active_for(FUJI).await.is_empty());
    ledger.remove("7", FUJI).await;
    assert_eq!(store.get(PENDING_TRANSFERS_KEY).await.unwrap().as_deref(), Some("{not json"));

    ledger.record("7", "ipfs://abc", SEPOLIA, FUJI).await;
    assert_eq!(ledger.list_active_for(FUJI).await.len(), 1);
}

#[tokio::test]
async fn test_unreadable_store_never_overwrites_entries() {
    let store = Arc::new(LockedReadStore::default());
    let ledger = PendingTransferLedger::new(store.clone());
    ledger.record("1", "ipfs://one", SEPOLIA, FUJI).await;
    ledger.record("2", "ipfs://two", SEPOLIA, FUJI).await;
    let saved = store.get(PENDING_TRANSFERS_KEY).await.unwrap();

    store.fail_next_reads(1);
    ledger.record("3", "ipfs://three", SEPOLIA, FUJI).await;
    assert_eq!(store.get(PENDING_TRANSFERS_KEY).await.unwrap(), saved);

    store.fail_next_reads(1);
    ledger.remove("1", FUJI).await;
    store.fail_next_reads(1);
    assert_eq!(ledger.prune_expired().await, 0);
    assert_eq!(store.get(PENDING_TRANSFERS_KEY).await.unwrap(), saved);

    store.fail_next_reads(1);
    assert!(ledger.list_active_for(FUJI).await.is_empty());

    let ids: Vec<String> =
        ledger.list_active_for(FUJI).await.into_iter().map(|e| e.token_id).collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[tokio::test]
async fn test_file_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("pending.json");

    let ledger = PendingTransferLedger::new(Arc::new(FileStore::new(&path)));
    ledger.record("7", "ipfs://abc", SEPOLIA, FUJI).await;

    let reopened = PendingTransferLedger::new(Arc::new(FileStore::new(&path)));
    let active = reopened.list_active_for(FUJI).await;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].metadata_uri, "ipfs://abc");

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(raw.get(PENDING_TRANSFERS_KEY).is_some());
}

#[tokio::test]
async fn test_sqlite_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("pending.db").display());

    let ledger = PendingTransferLedger::new(Arc::new(SqliteStore::connect(&url).await.unwrap()));
    ledger.record("7", "ipfs://abc", SEPOLIA, FUJI).await;
    ledger.record("8", "ipfs://def", SEPOLIA, FUJI).await;
    ledger.remove("8", FUJI).await;

    let reopened = PendingTransferLedger::new(Arc::new(SqliteStore::connect(&url).await.unwrap()));
    let active = reopened.list_active_for(FUJI).await;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].token_id, "7");
}

#[tokio::test]
async fn test_open_store_selects_backend() {
    let dir = tempdir().unwrap();
    let config = LedgerConfig {
        backend: LedgerBackend::File,
        path: dir.path().join("ledger.json"),
        ..LedgerConfig::default()
    };
    let store = open_store(&config).await.unwrap();
    store.set("k", "v").await.unwrap();
    assert!(dir.path().join("ledger.json").exists());

    let memory = open_store(&LedgerConfig { backend: LedgerBackend::Memory, ..LedgerConfig::default() })
        .await
        .unwrap();
    assert_eq!(memory.get("k").await.unwrap(), None);
}

fn arb_entry() -> impl Strategy<Value = PendingTransfer> {
    (0u64..5, prop_oneof![Just(SEPOLIA), Just(FUJI), Just(1u64)], 0i64..(14 * 24)).prop_map(
        |(token, destination, age_hours)| entry(&token.to_string(), destination, Duration::hours(age_hours)),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn active_entries_are_fresh_and_on_chain(
        entries in proptest::collection::vec(arb_entry(), 0..20),
        chain in prop_oneof![Just(SEPOLIA), Just(FUJI)],
    ) {
        let active = block_on(async { seeded(&entries).await.list_active_for(chain).await });
        let now = Utc::now();
        for e in &active {
            prop_assert_eq!(e.destination_chain_id, chain);
            prop_assert!(now - e.captured_at < Duration::days(7));
        }
        let expected = entries
            .iter()
            .filter(|e| e.destination_chain_id == chain && e.captured_at > now - Duration::days(7) + Duration::minutes(1))
            .count();
        prop_assert!(active.len() >= expected);
    }

    #[test]
    fn remove_twice_equals_remove_once(
        entries in proptest::collection::vec(arb_entry(), 0..20),
        token in 0u64..5,
        chain in prop_oneof![Just(SEPOLIA), Just(FUJI)],
    ) {
        let token = token.to_string();
        let (once, twice) = block_on(async {
            let a = seeded(&entries).await;
            a.remove(&token, chain).await;
            let b = seeded(&entries).await;
            b.remove(&token, chain).await;
            b.remove(&token, chain).await;
            (a.list_active_for(chain).await, b.list_active_for(chain).await)
        });
        prop_assert!(once.iter().all(|e| e.token_id != token));
        prop_assert_eq!(once, twice);
    }
}
