// src/blockchain/bridge/orchestrator.rs
//! Bridge transfer orchestrator
//!
//! Runs one transfer attempt as capture -> quote -> approve -> send. Each step is
//! marked `loading` right before its chain call and settled right after it. Metadata
//! is captured into the ledger before anything irreversible happens, and no
//! transaction is submitted until a fee quote has succeeded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ethers::types::{Address, U256};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::steps::{AttemptState, BridgeSteps, StepId, StepStatus};
use crate::blockchain::traits::NftBridgeContract;
use crate::core::config::{BridgeSettings, ChainRegistry};
use crate::core::domain::{format_tx_hash, parse_token_id, MessagingFee, SendParam, TxHash};
use crate::core::errors::{BridgeError, ContractError};
use crate::storage::PendingTransferLedger;
use crate::tools::async_support::{execute_with_timeout, TimeoutConfig};

pub const BRIDGE_SUCCESS_STATUS: &str =
    "NFT successfully bridged! 🎉 Switch to the destination chain to restore metadata.";

/// Snapshot published to progress subscribers after every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BridgeProgress {
    pub state: AttemptState,
    pub steps: BridgeSteps,
    /// Transient status line ("Estimating fees...").
    pub status: Option<String>,
    /// Sanitized error of the last failed attempt or restoration.
    pub error: Option<String>,
    pub restoring: bool,
}

/// What a successful attempt produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeReceipt {
    pub token_id: String,
    pub source_chain_id: u64,
    pub destination_chain_id: u64,
    /// `None` when the token had no metadata to capture.
    pub metadata_uri: Option<String>,
    pub fee: MessagingFee,
    pub approve_tx: TxHash,
    pub send_tx: TxHash,
    pub steps: BridgeSteps,
}

pub type RefreshCallback = Arc<dyn Fn() + Send + Sync>;

struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag.clone()))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct BridgeOrchestrator {
    pub(super) contract: Arc<dyn NftBridgeContract>,
    pub(super) ledger: Arc<PendingTransferLedger>,
    pub(super) chains: ChainRegistry,
    pub(super) wallet: Option<Address>,
    pub(super) settings: BridgeSettings,
    pub(super) progress: Arc<watch::Sender<BridgeProgress>>,
    in_flight: Arc<AtomicBool>,
    pub(super) on_success: Option<RefreshCallback>,
}

impl BridgeOrchestrator {
    pub fn new(
        contract: Arc<dyn NftBridgeContract>,
        ledger: Arc<PendingTransferLedger>,
        chains: ChainRegistry,
        settings: BridgeSettings,
    ) -> Self {
        let (tx, _rx) = watch::channel(BridgeProgress::default());
        Self {
            contract,
            ledger,
            chains,
            wallet: None,
            settings,
            progress: Arc::new(tx),
            in_flight: Arc::new(AtomicBool::new(false)),
            on_success: None,
        }
    }

    /// Connected wallet; `None` means disconnected.
    pub fn with_wallet(mut self, wallet: Option<Address>) -> Self {
        self.wallet = wallet;
        self
    }

    /// Called after a finished bridge or restoration, once its message has been shown.
    pub fn on_success(mut self, callback: RefreshCallback) -> Self {
        self.on_success = Some(callback);
        self
    }

    /// Chain the wallet is currently on.
    pub fn current_chain_id(&self) -> u64 {
        self.contract.chain_id()
    }

    pub fn ledger(&self) -> &Arc<PendingTransferLedger> {
        &self.ledger
    }

    pub fn subscribe(&self) -> watch::Receiver<BridgeProgress> {
        self.progress.subscribe()
    }

    pub fn progress(&self) -> BridgeProgress {
        self.progress.borrow().clone()
    }

    pub fn is_bridging(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Close the progress view. A failed attempt goes back to idle; a running one keeps going.
    pub fn dismiss(&self) {
        self.progress.send_modify(|p| {
            if matches!(p.state, AttemptState::Failed { .. }) {
                p.state = AttemptState::Idle;
                p.error = None;
            }
        });
    }

    /// Bridge `token_id` to `destination_chain_id`.
    ///
    /// Both arguments mirror an unfinished UI selection, so `None` is a validation error.
    pub async fn bridge_nft(
        &self,
        token_id: Option<&str>,
        destination_chain_id: Option<u64>,
    ) -> Result<BridgeReceipt, BridgeError> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(BridgeError::Busy)?;

        let request = match self.validate(token_id, destination_chain_id) {
            Ok(request) => request,
            Err(e) => {
                warn!("bridge request rejected: {}", e);
                self.progress.send_modify(|p| p.error = Some(e.user_message()));
                return Err(e);
            }
        };

        info!(
            token_id = %request.token_id,
            source_chain_id = request.source_chain_id,
            destination_chain_id = request.destination_chain_id,
            "Starting bridge attempt"
        );
        self.progress.send_replace(BridgeProgress::default());

        match self.run_attempt(&request).await {
            Ok(receipt) => {
                info!(
                    token_id = %receipt.token_id,
                    send_tx = %format_tx_hash(&receipt.send_tx),
                    "Bridge transfer submitted and confirmed"
                );
                self.progress.send_modify(|p| p.state = AttemptState::Done);
                self.schedule_success_cleanup();
                Ok(receipt)
            }
            Err(e) => {
                error!(token_id = %request.token_id, "Bridge attempt failed: {}", e);
                let message = format!("Bridging failed: {}", e.user_message());
                self.progress.send_modify(|p| {
                    let step = p.state.step();
                    if let Some(step) = step {
                        p.steps.advance(step, StepStatus::Error);
                    }
                    p.state = AttemptState::Failed { step, message: message.clone() };
                    p.status = None;
                    p.error = Some(message);
                });
                Err(e)
            }
        }
    }

    fn validate(
        &self,
        token_id: Option<&str>,
        destination_chain_id: Option<u64>,
    ) -> Result<BridgeRequest, BridgeError> {
        let wallet =
            self.wallet.ok_or_else(|| BridgeError::Validation("Wallet not connected".into()))?;
        let token_raw = token_id
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| BridgeError::Validation("Select an NFT to bridge".into()))?;
        let destination_chain_id = destination_chain_id
            .ok_or_else(|| BridgeError::Validation("Select a destination chain".into()))?;
        let token = parse_token_id(token_raw)?;

        let source_chain_id = self.current_chain_id();
        if destination_chain_id == source_chain_id {
            return Err(BridgeError::Validation(
                "Destination chain must differ from the current chain".into(),
            ));
        }
        let dst_eid = self.chains.endpoint_id(destination_chain_id)?;

        Ok(BridgeRequest {
            wallet,
            token,
            token_id: token.to_string(),
            source_chain_id,
            destination_chain_id,
            dst_eid,
        })
    }

    async fn run_attempt(&self, request: &BridgeRequest) -> Result<BridgeReceipt, BridgeError> {
        // capture
        self.enter(AttemptState::Capturing);
        let uri = self
            .contract
            .token_uri_for_bridge(request.token)
            .await
            .map_err(|e| BridgeError::Capture(e.to_string()))?;
        let metadata_uri = if uri.is_empty() {
            info!(token_id = %request.token_id, "Token has no metadata URI, nothing to capture");
            None
        } else {
            debug!(token_id = %request.token_id, uri = %uri, "Original URI captured");
            self.ledger
                .record(
                    &request.token_id,
                    &uri,
                    request.source_chain_id,
                    request.destination_chain_id,
                )
                .await;
            Some(uri)
        };
        self.settle(StepId::Capture);

        // quote
        self.enter(AttemptState::Quoting);
        self.set_status("Creating send parameters...");
        let param = SendParam::transfer(request.dst_eid, request.wallet, request.token);
        self.set_status("Estimating fees...");
        let fee = self
            .contract
            .quote_send(&param, false)
            .await
            .map_err(|e| BridgeError::Quote(e.to_string()))?;
        debug!(native_fee = %fee.native_fee, lz_token_fee = %fee.lz_token_fee, "Fee quoted");

        // approve
        self.enter(AttemptState::Approving);
        let approve_tx = self
            .contract
            .approve(self.contract.address(), request.token)
            .await
            .map_err(|e| tx_error(StepId::Approve, e))?;
        self.confirm(StepId::Approve, approve_tx).await?;
        self.settle(StepId::Approve);

        // send
        self.enter(AttemptState::Sending);
        let send_tx = self
            .contract
            .send(&param, fee, request.wallet)
            .await
            .map_err(|e| tx_error(StepId::Bridge, e))?;
        self.enter(AttemptState::Confirming);
        self.confirm(StepId::Bridge, send_tx).await?;
        self.settle(StepId::Bridge);

        Ok(BridgeReceipt {
            token_id: request.token_id.clone(),
            source_chain_id: request.source_chain_id,
            destination_chain_id: request.destination_chain_id,
            metadata_uri,
            fee,
            approve_tx,
            send_tx,
            steps: self.progress.borrow().steps.clone(),
        })
    }

    /// Move to `state`; its step (if any) goes to `loading`.
    fn enter(&self, state: AttemptState) {
        debug!(?state, "bridge attempt state");
        self.progress.send_modify(|p| {
            if let Some(step) = state.step() {
                if p.steps.status(step) == StepStatus::Pending {
                    p.steps.advance(step, StepStatus::Loading);
                }
            }
            p.state = state;
        });
    }

    fn settle(&self, step: StepId) {
        self.progress.send_modify(|p| {
            p.steps.advance(step, StepStatus::Completed);
        });
    }

    pub(super) fn set_status(&self, status: impl Into<String>) {
        let status = status.into();
        self.progress.send_modify(|p| p.status = Some(status));
    }

    /// Wait for `step`'s transaction to reach the configured depth.
    pub(super) async fn confirm(&self, step: StepId, tx: TxHash) -> Result<(), BridgeError> {
        self.wait_confirmed(
            &step.to_string(),
            tx,
            |e| tx_error(step, e),
            |waited| BridgeError::ConfirmationTimeout { step, waited },
        )
        .await
    }

    /// Wait for the configured depth, bounded by the confirmation timeout.
    pub(super) async fn wait_confirmed(
        &self,
        operation: &str,
        tx: TxHash,
        on_error: impl FnOnce(ContractError) -> BridgeError,
        on_timeout: impl FnOnce(Duration) -> BridgeError,
    ) -> Result<(), BridgeError> {
        info!(operation, tx_hash = %format_tx_hash(&tx), confirmations = self.settings.confirmations, "Waiting for confirmations");
        let config = TimeoutConfig::new(self.settings.confirmation_timeout(), format!("{} confirmation", operation));
        execute_with_timeout(
            async {
                self.contract
                    .wait_for_confirmations(tx, self.settings.confirmations)
                    .await
                    .map_err(on_error)
            },
            &config,
            on_timeout,
        )
        .await
    }

    fn schedule_success_cleanup(&self) {
        let progress = self.progress.clone();
        let on_success = self.on_success.clone();
        let display = self.settings.success_display_delay();
        let clear = self.settings.status_clear_delay();

        tokio::spawn(async move {
            tokio::time::sleep(display).await;
            progress.send_modify(|p| p.status = Some(BRIDGE_SUCCESS_STATUS.to_string()));
            tokio::time::sleep(clear).await;

            let mut cleared = false;
            progress.send_if_modified(|p| {
                // a newer attempt owns the state now
                if p.state != AttemptState::Done {
                    return false;
                }
                *p = BridgeProgress { restoring: p.restoring, ..BridgeProgress::default() };
                cleared = true;
                true
            });
            if cleared {
                if let Some(callback) = on_success {
                    callback();
                }
            }
        });
    }
}

pub(super) fn tx_error(step: StepId, err: ContractError) -> BridgeError {
    BridgeError::Transaction { step, message: err.to_string() }
}

struct BridgeRequest {
    wallet: Address,
    token: U256,
    token_id: String,
    source_chain_id: u64,
    destination_chain_id: u64,
    dst_eid: u32,
}
