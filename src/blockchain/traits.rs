use async_trait::async_trait;
use ethers::types::{Address, U256};

use crate::core::domain::{MessagingFee, SendParam, TxHash};
use crate::core::errors::ContractError;

/// The MintX ONFT contract as seen by the bridge workflow.
///
/// Writes only submit the transaction and return its hash; callers decide how long
/// to wait through [`NftBridgeContract::wait_for_confirmations`].
#[async_trait]
pub trait NftBridgeContract: Send + Sync {
    /// Address of the deployed contract (the bridge is its own spender).
    fn address(&self) -> Address;

    /// Chain the contract client is connected to.
    fn chain_id(&self) -> u64;

    /// Whether any bytecode lives at the contract address.
    async fn is_deployed(&self) -> Result<bool, ContractError>;

    async fn balance_of(&self, owner: Address) -> Result<U256, ContractError>;

    async fn token_of_owner_by_index(
        &self,
        owner: Address,
        index: U256,
    ) -> Result<U256, ContractError>;

    async fn token_uri(&self, token_id: U256) -> Result<String, ContractError>;

    /// Reverts while the token does not exist on this chain.
    async fn owner_of(&self, token_id: U256) -> Result<Address, ContractError>;

    /// Current metadata URI, readable right before the token is burned for bridging.
    async fn token_uri_for_bridge(&self, token_id: U256) -> Result<String, ContractError>;

    async fn quote_send(
        &self,
        param: &SendParam,
        pay_in_lz_token: bool,
    ) -> Result<MessagingFee, ContractError>;

    async fn approve(&self, spender: Address, token_id: U256) -> Result<TxHash, ContractError>;

    /// Payable: `fee.native_fee` is attached as value.
    async fn send(
        &self,
        param: &SendParam,
        fee: MessagingFee,
        refund_address: Address,
    ) -> Result<TxHash, ContractError>;

    async fn set_bridged_token_uri(
        &self,
        token_id: U256,
        uri: &str,
    ) -> Result<TxHash, ContractError>;

    /// Resolve once `tx` is mined with a success status and buried `confirmations` deep.
    async fn wait_for_confirmations(
        &self,
        tx: TxHash,
        confirmations: usize,
    ) -> Result<(), ContractError>;
}
