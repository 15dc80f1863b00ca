// src/blockchain/bridge/mod.rs

// Expose sub-modules
pub mod mock;
pub mod orchestrator;
pub mod restore;
pub mod steps;

pub use orchestrator::{
    BridgeOrchestrator, BridgeProgress, BridgeReceipt, RefreshCallback, BRIDGE_SUCCESS_STATUS,
};
pub use restore::{RestoreReceipt, RESTORE_SUCCESS_STATUS};
pub use steps::{AttemptState, BridgeStep, BridgeSteps, StepId, StepStatus};

use crate::core::errors::BridgeError;
use crate::storage::PendingTransfer;

/// Thin facade: bridge `token_id` to `destination_chain_id`.
pub async fn bridge_nft(
    orchestrator: &BridgeOrchestrator,
    token_id: &str,
    destination_chain_id: u64,
) -> Result<BridgeReceipt, BridgeError> {
    orchestrator.bridge_nft(Some(token_id), Some(destination_chain_id)).await
}

/// Thin facade: restore the newest pending entry for `token_id` on the current chain.
pub async fn restore_pending(
    orchestrator: &BridgeOrchestrator,
    token_id: &str,
) -> Result<RestoreReceipt, BridgeError> {
    let chain_id = orchestrator.current_chain_id();
    let entry = find_pending(orchestrator, token_id).await?;
    tracing::info!(token_id, chain_id, "Restoring pending transfer");
    orchestrator.restore_metadata(token_id, &entry).await
}

async fn find_pending(
    orchestrator: &BridgeOrchestrator,
    token_id: &str,
) -> Result<PendingTransfer, BridgeError> {
    let chain_id = orchestrator.current_chain_id();
    let canonical = crate::core::domain::parse_token_id(token_id)?.to_string();
    orchestrator.ledger().find_active(&canonical, chain_id).await.ok_or_else(|| {
        BridgeError::Validation(format!(
            "No pending transfer for token {} on chain {}",
            token_id, chain_id
        ))
    })
}
