// src/blockchain/bridge/mock.rs
//! Scripted in-memory contract used by tests and dry runs.
//!
//! Every trait call is appended to a call log so tests can assert on ordering.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use parking_lot::Mutex;

use crate::blockchain::traits::NftBridgeContract;
use crate::core::domain::{MessagingFee, SendParam, TxHash};
use crate::core::errors::ContractError;
use crate::storage::PendingTransferLedger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    IsDeployed,
    BalanceOf(Address),
    TokenOfOwnerByIndex(Address, U256),
    TokenUri(U256),
    OwnerOf(U256),
    TokenUriForBridge(U256),
    QuoteSend { dst_eid: u32, token_id: U256, pay_in_lz_token: bool },
    Approve { spender: Address, token_id: U256 },
    Send { dst_eid: u32, to: [u8; 32], token_id: U256, native_fee: U256, refund: Address },
    SetBridgedTokenUri { token_id: U256, uri: String },
    WaitForConfirmations { tx: TxHash, confirmations: usize },
}

impl ContractCall {
    /// Whether the call submits a transaction.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            ContractCall::Approve { .. } | ContractCall::Send { .. } | ContractCall::SetBridgedTokenUri { .. }
        )
    }
}

/// How a scripted write behaves.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TxOutcome {
    #[default]
    Confirmed,
    /// Rejected before a hash exists (wallet rejection, estimation failure).
    RejectedOnSubmit(String),
    /// Mined with a failed status.
    RevertedOnConfirm,
    /// The confirmation wait never resolves.
    NeverConfirms,
}

/// One scripted `ownerOf` answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerReply {
    Revert,
    Zero,
    Owner(Address),
}

struct MockState {
    calls: Vec<ContractCall>,
    deployed: bool,
    owned: Vec<(U256, String)>,
    failing_uris: HashSet<U256>,
    bridge_uri: Result<String, ContractError>,
    quote: Result<MessagingFee, ContractError>,
    approve: TxOutcome,
    send: TxOutcome,
    restore: TxOutcome,
    owner_replies: VecDeque<OwnerReply>,
    default_owner_reply: OwnerReply,
    submitted: HashMap<TxHash, TxOutcome>,
    next_tx: u64,
    ledger_counts_at_send: Vec<usize>,
}

pub struct MockNftContract {
    address: Address,
    chain_id: u64,
    state: Mutex<MockState>,
    ledger_probe: Option<(Arc<PendingTransferLedger>, u64)>,
}

impl MockNftContract {
    pub fn new(address: Address, chain_id: u64) -> Self {
        Self {
            address,
            chain_id,
            state: Mutex::new(MockState {
                calls: Vec::new(),
                deployed: true,
                owned: Vec::new(),
                failing_uris: HashSet::new(),
                bridge_uri: Ok(String::new()),
                quote: Ok(MessagingFee::default()),
                approve: TxOutcome::Confirmed,
                send: TxOutcome::Confirmed,
                restore: TxOutcome::Confirmed,
                owner_replies: VecDeque::new(),
                default_owner_reply: OwnerReply::Revert,
                submitted: HashMap::new(),
                next_tx: 1,
                ledger_counts_at_send: Vec::new(),
            }),
            ledger_probe: None,
        }
    }

    pub fn with_deployed(self, deployed: bool) -> Self {
        self.state.lock().deployed = deployed;
        self
    }

    /// Tokens owned by any queried owner, with their `tokenURI`.
    pub fn with_owned_token(self, token_id: u64, uri: &str) -> Self {
        self.state.lock().owned.push((U256::from(token_id), uri.to_string()));
        self
    }

    /// `tokenURI` reverts for this token.
    pub fn with_failing_token_uri(self, token_id: u64) -> Self {
        self.state.lock().failing_uris.insert(U256::from(token_id));
        self
    }

    pub fn with_bridge_uri(self, uri: &str) -> Self {
        self.state.lock().bridge_uri = Ok(uri.to_string());
        self
    }

    pub fn with_bridge_uri_error(self, err: ContractError) -> Self {
        self.state.lock().bridge_uri = Err(err);
        self
    }

    pub fn with_quote(self, quote: Result<MessagingFee, ContractError>) -> Self {
        self.state.lock().quote = quote;
        self
    }

    pub fn with_approve(self, outcome: TxOutcome) -> Self {
        self.state.lock().approve = outcome;
        self
    }

    pub fn with_send(self, outcome: TxOutcome) -> Self {
        self.state.lock().send = outcome;
        self
    }

    pub fn with_restore(self, outcome: TxOutcome) -> Self {
        self.state.lock().restore = outcome;
        self
    }

    /// Queue `ownerOf` replies; once drained, `default` is returned forever.
    pub fn with_owner_replies(self, replies: impl IntoIterator<Item = OwnerReply>, default: OwnerReply) -> Self {
        {
            let mut state = self.state.lock();
            state.owner_replies.extend(replies);
            state.default_owner_reply = default;
        }
        self
    }

    /// Record the active ledger size for `chain_id` whenever `send` is called.
    pub fn with_ledger_probe(mut self, ledger: Arc<PendingTransferLedger>, chain_id: u64) -> Self {
        self.ledger_probe = Some((ledger, chain_id));
        self
    }

    pub fn calls(&self) -> Vec<ContractCall> {
        self.state.lock().calls.clone()
    }

    pub fn count_calls(&self, pred: impl Fn(&ContractCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn ledger_counts_at_send(&self) -> Vec<usize> {
        self.state.lock().ledger_counts_at_send.clone()
    }

    fn record(&self, call: ContractCall) {
        self.state.lock().calls.push(call);
    }

    fn submit(&self, call: ContractCall, pick: impl FnOnce(&MockState) -> TxOutcome) -> Result<TxHash, ContractError> {
        let mut state = self.state.lock();
        state.calls.push(call);
        let outcome = pick(&state);
        if let TxOutcome::RejectedOnSubmit(reason) = outcome {
            return Err(ContractError::Provider(reason));
        }
        let tx = H256::from_low_u64_be(state.next_tx);
        state.next_tx += 1;
        state.submitted.insert(tx, outcome);
        Ok(tx)
    }
}

#[async_trait]
impl NftBridgeContract for MockNftContract {
    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn is_deployed(&self) -> Result<bool, ContractError> {
        self.record(ContractCall::IsDeployed);
        Ok(self.state.lock().deployed)
    }

    async fn balance_of(&self, owner: Address) -> Result<U256, ContractError> {
        let mut state = self.state.lock();
        state.calls.push(ContractCall::BalanceOf(owner));
        Ok(U256::from(state.owned.len()))
    }

    async fn token_of_owner_by_index(&self, owner: Address, index: U256) -> Result<U256, ContractError> {
        let mut state = self.state.lock();
        state.calls.push(ContractCall::TokenOfOwnerByIndex(owner, index));
        state
            .owned
            .get(index.as_usize())
            .map(|(id, _)| *id)
            .ok_or_else(|| ContractError::Reverted("ERC721OutOfBoundsIndex".into()))
    }

    async fn token_uri(&self, token_id: U256) -> Result<String, ContractError> {
        let mut state = self.state.lock();
        state.calls.push(ContractCall::TokenUri(token_id));
        if state.failing_uris.contains(&token_id) {
            return Err(ContractError::Reverted("ERC721NonexistentToken".into()));
        }
        state
            .owned
            .iter()
            .find(|(id, _)| *id == token_id)
            .map(|(_, uri)| uri.clone())
            .ok_or_else(|| ContractError::Reverted("ERC721NonexistentToken".into()))
    }

    async fn owner_of(&self, token_id: U256) -> Result<Address, ContractError> {
        let reply = {
            let mut state = self.state.lock();
            state.calls.push(ContractCall::OwnerOf(token_id));
            let fallback = state.default_owner_reply;
            state.owner_replies.pop_front().unwrap_or(fallback)
        };
        match reply {
            OwnerReply::Revert => Err(ContractError::Reverted("ERC721NonexistentToken".into())),
            OwnerReply::Zero => Ok(Address::zero()),
            OwnerReply::Owner(owner) => Ok(owner),
        }
    }

    async fn token_uri_for_bridge(&self, token_id: U256) -> Result<String, ContractError> {
        let mut state = self.state.lock();
        state.calls.push(ContractCall::TokenUriForBridge(token_id));
        state.bridge_uri.clone()
    }

    async fn quote_send(&self, param: &SendParam, pay_in_lz_token: bool) -> Result<MessagingFee, ContractError> {
        let mut state = self.state.lock();
        state.calls.push(ContractCall::QuoteSend {
            dst_eid: param.dst_eid,
            token_id: param.token_id,
            pay_in_lz_token,
        });
        state.quote.clone()
    }

    async fn approve(&self, spender: Address, token_id: U256) -> Result<TxHash, ContractError> {
        self.submit(ContractCall::Approve { spender, token_id }, |s| s.approve.clone())
    }

    async fn send(&self, param: &SendParam, fee: MessagingFee, refund_address: Address) -> Result<TxHash, ContractError> {
        if let Some((ledger, chain_id)) = &self.ledger_probe {
            let count = ledger.list_active_for(*chain_id).await.len();
            self.state.lock().ledger_counts_at_send.push(count);
        }
        self.submit(
            ContractCall::Send {
                dst_eid: param.dst_eid,
                to: param.to,
                token_id: param.token_id,
                native_fee: fee.native_fee,
                refund: refund_address,
            },
            |s| s.send.clone(),
        )
    }

    async fn set_bridged_token_uri(&self, token_id: U256, uri: &str) -> Result<TxHash, ContractError> {
        self.submit(ContractCall::SetBridgedTokenUri { token_id, uri: uri.to_string() }, |s| s.restore.clone())
    }

    async fn wait_for_confirmations(&self, tx: TxHash, confirmations: usize) -> Result<(), ContractError> {
        let outcome = {
            let mut state = self.state.lock();
            state.calls.push(ContractCall::WaitForConfirmations { tx, confirmations });
            state.submitted.get(&tx).cloned()
        };
        match outcome {
            Some(TxOutcome::Confirmed) => Ok(()),
            Some(TxOutcome::RevertedOnConfirm) => {
                Err(ContractError::Reverted(format!("transaction {:?} failed", tx)))
            }
            Some(TxOutcome::NeverConfirms) => std::future::pending().await,
            Some(TxOutcome::RejectedOnSubmit(_)) | None => Err(ContractError::Dropped(format!("{:?}", tx))),
        }
    }
}
