// tests/util.rs
// Shared test helpers for integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use ethers::types::{Address, U256};
use mintx_bridge::blockchain::bridge::mock::MockNftContract;
use mintx_bridge::blockchain::bridge::BridgeOrchestrator;
use mintx_bridge::core::config::{AppConfig, BridgeSettings, FUJI_CHAIN_ID, SEPOLIA_CHAIN_ID};
use mintx_bridge::core::MessagingFee;
use mintx_bridge::storage::{Clock, MemoryStore, PendingTransferLedger};
use parking_lot::Mutex;

pub const SEPOLIA: u64 = SEPOLIA_CHAIN_ID;
pub const FUJI: u64 = FUJI_CHAIN_ID;

pub fn wallet() -> Address {
    Address::repeat_byte(0xaa)
}

pub fn contract_address() -> Address {
    Address::repeat_byte(0xcc)
}

/// `{nativeFee: 0.001 ether, lzTokenFee: 0}`
pub fn quoted_fee() -> MessagingFee {
    MessagingFee { native_fee: U256::from(1_000_000_000_000_000u64), lz_token_fee: U256::zero() }
}

/// Clock that only moves when told to.
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(now)))
    }

    pub fn advance(&self, by: Duration) {
        *self.0.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock()
    }
}

pub fn memory_ledger() -> Arc<PendingTransferLedger> {
    Arc::new(PendingTransferLedger::new(Arc::new(MemoryStore::new())))
}

/// Mock on `chain_id` whose happy path bridges `ipfs://abc` for the default fee.
pub fn happy_contract(chain_id: u64) -> MockNftContract {
    MockNftContract::new(contract_address(), chain_id)
        .with_bridge_uri("ipfs://abc")
        .with_quote(Ok(quoted_fee()))
}

pub fn orchestrator(
    contract: Arc<MockNftContract>,
    ledger: Arc<PendingTransferLedger>,
) -> BridgeOrchestrator {
    orchestrator_with(contract, ledger, BridgeSettings::default())
}

pub fn orchestrator_with(
    contract: Arc<MockNftContract>,
    ledger: Arc<PendingTransferLedger>,
    settings: BridgeSettings,
) -> BridgeOrchestrator {
    BridgeOrchestrator::new(contract, ledger, AppConfig::default().registry(), settings)
        .with_wallet(Some(wallet()))
}

/// Counts how often the refresh callback fired.
pub fn refresh_counter() -> (Arc<AtomicUsize>, Arc<dyn Fn() + Send + Sync>) {
    let count = Arc::new(AtomicUsize::new(0));
    let hook = count.clone();
    (count, Arc::new(move || {
        hook.fetch_add(1, Ordering::SeqCst);
    }))
}
