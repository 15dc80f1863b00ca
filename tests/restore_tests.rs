// tests/restore_tests.rs
//! Destination-side metadata restoration

mod util;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use ethers::types::{Address, U256};
use mintx_bridge::blockchain::bridge::mock::{ContractCall, MockNftContract, OwnerReply, TxOutcome};
use mintx_bridge::blockchain::bridge::{self, RESTORE_SUCCESS_STATUS};
use mintx_bridge::core::errors::BridgeError;
use mintx_bridge::storage::{PendingTransfer, PendingTransferLedger};
use pretty_assertions::assert_eq;
use util::{FUJI, SEPOLIA};

fn owner() -> Address {
    Address::repeat_byte(0x42)
}

async fn ledger_with_entry() -> (Arc<PendingTransferLedger>, PendingTransfer) {
    let ledger = util::memory_ledger();
    ledger.record("7", "ipfs://abc", SEPOLIA, FUJI).await;
    let entry = ledger.find_active("7", FUJI).await.unwrap();
    (ledger, entry)
}

fn destination(replies: Vec<OwnerReply>, default: OwnerReply) -> Arc<MockNftContract> {
    Arc::new(
        MockNftContract::new(util::contract_address(), FUJI).with_owner_replies(replies, default),
    )
}

#[tokio::test(start_paused = true)]
async fn test_restore_after_token_arrives() {
    let (ledger, entry) = ledger_with_entry().await;
    let contract = destination(vec![OwnerReply::Revert; 5], OwnerReply::Owner(owner()));
    let orchestrator = util::orchestrator(contract.clone(), ledger.clone());

    let started = tokio::time::Instant::now();
    let receipt = orchestrator.restore_metadata("7", &entry).await.unwrap();

    assert_eq!(receipt.owner, owner());
    assert_eq!(receipt.attempts, 6);
    assert_eq!(started.elapsed(), Duration::from_secs(15));

    let calls = contract.calls();
    assert_eq!(calls.iter().filter(|c| matches!(c, ContractCall::OwnerOf(_))).count(), 6);
    let writes: Vec<&ContractCall> = calls.iter().filter(|c| c.is_write()).collect();
    assert_eq!(
        writes,
        vec![&ContractCall::SetBridgedTokenUri { token_id: U256::from(7u64), uri: "ipfs://abc".into() }]
    );
    let last_owner_check = calls.iter().rposition(|c| matches!(c, ContractCall::OwnerOf(_))).unwrap();
    let write = calls.iter().position(ContractCall::is_write).unwrap();
    assert!(last_owner_check < write);
    assert!(calls.contains(&ContractCall::WaitForConfirmations { tx: receipt.tx, confirmations: 2 }));

    assert!(ledger.find_active("7", FUJI).await.is_none());
    let progress = orchestrator.progress();
    assert!(!progress.restoring);
    assert_eq!(progress.status.as_deref(), Some(RESTORE_SUCCESS_STATUS));
}

#[tokio::test(start_paused = true)]
async fn test_restore_gives_up_after_twenty_checks() {
    let (ledger, entry) = ledger_with_entry().await;
    let contract = destination(Vec::new(), OwnerReply::Revert);
    let orchestrator = util::orchestrator(contract.clone(), ledger.clone());

    let err = orchestrator.restore_metadata("7", &entry).await.unwrap_err();

    assert_eq!(err, BridgeError::RestoreTimeout { token_id: "7".into(), attempts: 20 });
    assert!(err.is_timeout());
    assert!(err.is_retryable());
    assert_eq!(contract.count_calls(|c| matches!(c, ContractCall::OwnerOf(_))), 20);
    assert_eq!(contract.count_calls(ContractCall::is_write), 0);
    assert_eq!(ledger.find_active("7", FUJI).await, Some(entry));

    let progress = orchestrator.progress();
    assert!(!progress.restoring);
    assert_eq!(
        progress.error.as_deref(),
        Some("Token has not arrived on destination chain yet. Please wait a few more minutes and try again.")
    );
}

#[tokio::test(start_paused = true)]
async fn test_zero_owner_counts_as_not_arrived() {
    let (ledger, entry) = ledger_with_entry().await;
    let contract = destination(vec![OwnerReply::Zero, OwnerReply::Revert], OwnerReply::Owner(owner()));
    let orchestrator = util::orchestrator(contract.clone(), ledger);

    let receipt = orchestrator.restore_metadata("7", &entry).await.unwrap();
    assert_eq!(receipt.attempts, 3);
}

#[tokio::test(start_paused = true)]
async fn test_failed_write_keeps_entry_for_retry() {
    let (ledger, entry) = ledger_with_entry().await;
    let contract = Arc::new(
        MockNftContract::new(util::contract_address(), FUJI)
            .with_owner_replies(Vec::new(), OwnerReply::Owner(owner()))
            .with_restore(TxOutcome::RevertedOnConfirm),
    );
    let orchestrator = util::orchestrator(contract, ledger.clone());

    let err = orchestrator.restore_metadata("7", &entry).await.unwrap_err();
    assert!(matches!(err, BridgeError::RestoreWrite(_)));
    assert!(err.is_retryable());
    assert_eq!(ledger.find_active("7", FUJI).await, Some(entry.clone()));

    let retry = Arc::new(
        MockNftContract::new(util::contract_address(), FUJI)
            .with_owner_replies(Vec::new(), OwnerReply::Owner(owner())),
    );
    util::orchestrator(retry, ledger.clone()).restore_metadata("7", &entry).await.unwrap();
    assert!(ledger.find_active("7", FUJI).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_unconfirmed_restore_write_times_out_as_restore() {
    let (ledger, entry) = ledger_with_entry().await;
    let contract = Arc::new(
        MockNftContract::new(util::contract_address(), FUJI)
            .with_owner_replies(Vec::new(), OwnerReply::Owner(owner()))
            .with_restore(TxOutcome::NeverConfirms),
    );
    let orchestrator = util::orchestrator(contract, ledger.clone());

    let err = orchestrator.restore_metadata("7", &entry).await.unwrap_err();

    assert_eq!(
        err,
        BridgeError::RestoreConfirmationTimeout {
            token_id: "7".into(),
            waited: Duration::from_secs(600)
        }
    );
    assert!(err.is_retryable());
    assert_eq!(ledger.find_active("7", FUJI).await, Some(entry));
    assert!(!orchestrator.progress().restoring);
}

#[tokio::test]
async fn test_restore_on_wrong_chain_rejected() {
    let (ledger, entry) = ledger_with_entry().await;
    let contract = Arc::new(MockNftContract::new(util::contract_address(), SEPOLIA));
    let orchestrator = util::orchestrator(contract.clone(), ledger.clone());

    let err = orchestrator.restore_metadata("7", &entry).await.unwrap_err();
    assert!(matches!(err, BridgeError::Validation(_)));
    assert!(contract.calls().is_empty());
    assert!(ledger.find_active("7", FUJI).await.is_some());
}

#[tokio::test]
async fn test_restore_for_other_token_rejected() {
    let (ledger, entry) = ledger_with_entry().await;
    let contract = destination(Vec::new(), OwnerReply::Owner(owner()));
    let orchestrator = util::orchestrator(contract.clone(), ledger);

    let err = orchestrator.restore_metadata("8", &entry).await.unwrap_err();
    assert!(matches!(err, BridgeError::Validation(_)));
    assert!(contract.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_restore_pending_looks_up_newest_entry() {
    let ledger = util::memory_ledger();
    ledger.record("7", "ipfs://old", SEPOLIA, FUJI).await;
    ledger.record("7", "ipfs://new", SEPOLIA, FUJI).await;
    let contract = destination(Vec::new(), OwnerReply::Owner(owner()));
    let orchestrator = util::orchestrator(contract.clone(), ledger.clone());

    bridge::restore_pending(&orchestrator, "7").await.unwrap();

    assert!(contract.calls().contains(&ContractCall::SetBridgedTokenUri {
        token_id: U256::from(7u64),
        uri: "ipfs://new".into(),
    }));
    // both captures for the pair are cleared
    assert!(ledger.list_active_for(FUJI).await.is_empty());
}

#[tokio::test]
async fn test_restore_pending_without_entry() {
    let contract = destination(Vec::new(), OwnerReply::Owner(owner()));
    let orchestrator = util::orchestrator(contract.clone(), util::memory_ledger());

    let err = bridge::restore_pending(&orchestrator, "7").await.unwrap_err();
    assert!(matches!(err, BridgeError::Validation(_)));
    assert!(contract.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_restore_success_message_clears_then_refreshes() {
    let (ledger, entry) = ledger_with_entry().await;
    let (count, hook) = util::refresh_counter();
    let contract = destination(Vec::new(), OwnerReply::Owner(owner()));
    let orchestrator = util::orchestrator(contract, ledger).on_success(hook);

    orchestrator.restore_metadata("7", &entry).await.unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(3100)).await;
    assert!(orchestrator.progress().status.is_none());
    assert_eq!(count.load(Ordering::SeqCst), 1);
}
