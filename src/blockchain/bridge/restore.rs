// src/blockchain/bridge/restore.rs
//! Metadata restoration on the destination chain
//!
//! Once the wallet is on the chain a token was bridged to, the token shows up there
//! only after the cross-chain message lands. Restoration polls `ownerOf` until it
//! does, writes the captured URI back, and only then clears the ledger entry.

use ethers::types::{Address, U256};
use tracing::{debug, error, info, warn};

use super::orchestrator::BridgeOrchestrator;
use crate::core::domain::{format_tx_hash, parse_token_id, TxHash};
use crate::core::errors::BridgeError;
use crate::storage::PendingTransfer;
use crate::tools::async_support::{poll_until, PollConfig, PollOutcome};

pub const RESTORE_SUCCESS_STATUS: &str = "Metadata successfully restored! 🎉";

/// What a successful restoration produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReceipt {
    pub token_id: String,
    /// Owner observed on the destination chain.
    pub owner: Address,
    /// Ownership checks made before the token was seen.
    pub attempts: u32,
    pub tx: TxHash,
}

impl BridgeOrchestrator {
    /// Wait for `token_id` to arrive on the current chain, then write `entry`'s URI back.
    ///
    /// A timeout or failed write leaves the ledger entry in place so the call can be
    /// retried without bridging again.
    pub async fn restore_metadata(
        &self,
        token_id: &str,
        entry: &PendingTransfer,
    ) -> Result<RestoreReceipt, BridgeError> {
        let chain_id = self.current_chain_id();
        let token = parse_token_id(token_id)?;
        if entry.token_id != token.to_string() {
            return Err(BridgeError::Validation(format!(
                "Pending entry is for token {}, not {}",
                entry.token_id, token_id
            )));
        }
        if entry.destination_chain_id != chain_id {
            return Err(BridgeError::Validation(format!(
                "Switch to chain {} to restore this token",
                entry.destination_chain_id
            )));
        }

        self.progress.send_modify(|p| {
            p.restoring = true;
            p.error = None;
        });

        let result = self.run_restore(token, entry).await;

        match &result {
            Ok(receipt) => {
                info!(
                    token_id = %receipt.token_id,
                    chain_id,
                    tx_hash = %format_tx_hash(&receipt.tx),
                    attempts = receipt.attempts,
                    "Metadata restored"
                );
                self.progress.send_modify(|p| {
                    p.restoring = false;
                    p.status = Some(RESTORE_SUCCESS_STATUS.to_string());
                });
                self.schedule_restore_cleanup();
            }
            Err(e) => {
                error!(token_id = %entry.token_id, chain_id, "Restoration failed: {}", e);
                let message = e.user_message();
                self.progress.send_modify(|p| {
                    p.restoring = false;
                    p.status = None;
                    p.error = Some(message);
                });
            }
        }
        result
    }

    async fn run_restore(
        &self,
        token: U256,
        entry: &PendingTransfer,
    ) -> Result<RestoreReceipt, BridgeError> {
        let chain_id = self.current_chain_id();
        let max_attempts = self.settings.restore_max_attempts;
        self.set_status("Checking if token exists on destination chain...");

        let config = PollConfig { max_attempts, interval: self.settings.restore_poll_interval() };
        let outcome = poll_until(config, |attempt| async move {
            match self.contract.owner_of(token).await {
                Ok(owner) if !owner.is_zero() => Some(owner),
                Ok(_) => {
                    debug!(token_id = %token, attempt, "ownerOf returned the zero address");
                    self.set_status(format!("Waiting for token to arrive... ({}/{})", attempt, max_attempts));
                    None
                }
                Err(e) => {
                    debug!(token_id = %token, attempt, "token not on chain yet: {}", e);
                    self.set_status(format!("Waiting for token to arrive... ({}/{})", attempt, max_attempts));
                    None
                }
            }
        })
        .await;

        let (owner, attempts) = match outcome {
            PollOutcome::Ready { value, attempts } => (value, attempts),
            PollOutcome::Exhausted { attempts } => {
                warn!(token_id = %entry.token_id, chain_id, attempts, "Token did not arrive within the poll budget");
                return Err(BridgeError::RestoreTimeout { token_id: entry.token_id.clone(), attempts });
            }
        };

        info!(token_id = %entry.token_id, ?owner, attempts, "Token found on destination chain");
        self.set_status("Token found! Restoring metadata...");

        let tx = self
            .contract
            .set_bridged_token_uri(token, &entry.metadata_uri)
            .await
            .map_err(|e| BridgeError::RestoreWrite(e.to_string()))?;
        self.wait_confirmed(
            "metadata restore",
            tx,
            |e| BridgeError::RestoreWrite(e.to_string()),
            |waited| BridgeError::RestoreConfirmationTimeout { token_id: entry.token_id.clone(), waited },
        )
        .await?;

        self.ledger.remove(&entry.token_id, chain_id).await;

        Ok(RestoreReceipt { token_id: entry.token_id.clone(), owner, attempts, tx })
    }

    fn schedule_restore_cleanup(&self) {
        let progress = self.progress.clone();
        let on_success = self.on_success.clone();
        let clear = self.settings.restore_clear_delay();

        tokio::spawn(async move {
            tokio::time::sleep(clear).await;
            progress.send_if_modified(|p| {
                if p.status.as_deref() != Some(RESTORE_SUCCESS_STATUS) {
                    return false;
                }
                p.status = None;
                true
            });
            if let Some(callback) = on_success {
                callback();
            }
        });
    }
}

