use std::{str::FromStr, sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use ethers::{
    prelude::*,
    providers::{Http, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, U256, U64},
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use super::traits::NftBridgeContract;
use crate::core::config::ChainConfig;
use crate::core::domain::{self, format_tx_hash, TxHash};
use crate::core::errors::ContractError;

mod bindings {
    use ethers::prelude::abigen;

    abigen!(
        MintX,
        r#"[
            struct SendParam { uint32 dstEid; bytes32 to; uint256 tokenId; bytes extraOptions; bytes composeMsg; bytes onftCmd; }
            struct MessagingFee { uint256 nativeFee; uint256 lzTokenFee; }
            function balanceOf(address owner) external view returns (uint256)
            function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256)
            function tokenURI(uint256 tokenId) external view returns (string)
            function ownerOf(uint256 tokenId) external view returns (address)
            function approve(address to, uint256 tokenId) external
            function getTokenURIForBridge(uint256 tokenId) external view returns (string)
            function setBridgedTokenURI(uint256 tokenId, string uri) external
            function quoteSend(SendParam sendParam, bool payInLzToken) external view returns (MessagingFee)
            function send(SendParam sendParam, MessagingFee fee, address refundAddress) external payable
        ]"#
    );
}

/// Signing middleware used against real networks.
pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

impl From<&domain::SendParam> for bindings::SendParam {
    fn from(p: &domain::SendParam) -> Self {
        bindings::SendParam {
            dst_eid: p.dst_eid,
            to: p.to,
            token_id: p.token_id,
            extra_options: p.extra_options.clone(),
            compose_msg: p.compose_msg.clone(),
            onft_cmd: p.onft_cmd.clone(),
        }
    }
}

impl From<domain::MessagingFee> for bindings::MessagingFee {
    fn from(f: domain::MessagingFee) -> Self {
        bindings::MessagingFee { native_fee: f.native_fee, lz_token_fee: f.lz_token_fee }
    }
}

fn call_error<M: Middleware>(err: ethers::contract::ContractError<M>) -> ContractError {
    if err.is_revert() {
        ContractError::Reverted(err.to_string())
    } else {
        ContractError::Provider(err.to_string())
    }
}

/// `NftBridgeContract` backed by an ethers middleware.
#[derive(Clone)]
pub struct EthersNftContract<M: Middleware + 'static> {
    contract: bindings::MintX<M>,
    client: Arc<M>,
    chain_id: u64,
}

impl EthersNftContract<SignerClient> {
    /// Connect to `chain` and sign with `private_key`.
    pub async fn connect(chain: &ChainConfig, private_key: &SecretString) -> Result<Self> {
        let contract_address = chain.contract_address.ok_or_else(|| {
            anyhow::anyhow!("No contract_address configured for {}", chain.name)
        })?;

        let rpc_url_clean = chain.rpc_url.trim();
        let parsed_url = reqwest::Url::parse(rpc_url_clean).map_err(|e| {
            anyhow::anyhow!(
                "Invalid RPC URL for {}: {}. Please check config.toml.",
                chain.name,
                e
            )
        })?;

        info!("Connecting to {} (chain {})", chain.name, chain.chain_id);
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(10));
        if let Ok(proxy) = std::env::var("HTTPS_PROXY").or_else(|_| std::env::var("HTTP_PROXY")) {
            if let Ok(p) = reqwest::Proxy::all(proxy) {
                builder = builder.proxy(p);
            }
        }
        let http =
            builder.build().map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;
        let provider = Provider::new(Http::new_with_client(parsed_url, http));

        let reported = provider
            .get_chainid()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get chain ID from {}: {}", chain.name, e))?
            .as_u64();
        if reported != chain.chain_id {
            return Err(anyhow::anyhow!(
                "RPC for {} reports chain {} but {} is configured",
                chain.name,
                reported,
                chain.chain_id
            ));
        }

        // Do NOT log key material.
        let wallet = LocalWallet::from_str(private_key.expose_secret().trim())
            .map_err(|e| anyhow::anyhow!("Invalid private key: {}", e))?
            .with_chain_id(chain.chain_id);

        info!(wallet = %format!("{:?}", wallet.address()), "Connected to {}", chain.name);
        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        Ok(Self::new(contract_address, client, chain.chain_id))
    }

    pub fn wallet_address(&self) -> Address {
        self.client.address()
    }
}

impl<M: Middleware + 'static> EthersNftContract<M> {
    /// Wrap an existing middleware; used with `MockProvider` in tests.
    pub fn new(address: Address, client: Arc<M>, chain_id: u64) -> Self {
        let contract = bindings::MintX::new(address, client.clone());
        Self { contract, client, chain_id }
    }
}

#[async_trait]
impl<M: Middleware + 'static> NftBridgeContract for EthersNftContract<M> {
    fn address(&self) -> Address {
        self.contract.address()
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn is_deployed(&self) -> Result<bool, ContractError> {
        let code = self
            .client
            .get_code(self.contract.address(), None)
            .await
            .map_err(|e| ContractError::Provider(e.to_string()))?;
        Ok(!code.as_ref().is_empty())
    }

    async fn balance_of(&self, owner: Address) -> Result<U256, ContractError> {
        self.contract.balance_of(owner).call().await.map_err(call_error)
    }

    async fn token_of_owner_by_index(
        &self,
        owner: Address,
        index: U256,
    ) -> Result<U256, ContractError> {
        self.contract.token_of_owner_by_index(owner, index).call().await.map_err(call_error)
    }

    async fn token_uri(&self, token_id: U256) -> Result<String, ContractError> {
        self.contract.token_uri(token_id).call().await.map_err(call_error)
    }

    async fn owner_of(&self, token_id: U256) -> Result<Address, ContractError> {
        self.contract.owner_of(token_id).call().await.map_err(call_error)
    }

    async fn token_uri_for_bridge(&self, token_id: U256) -> Result<String, ContractError> {
        self.contract.get_token_uri_for_bridge(token_id).call().await.map_err(call_error)
    }

    async fn quote_send(
        &self,
        param: &domain::SendParam,
        pay_in_lz_token: bool,
    ) -> Result<domain::MessagingFee, ContractError> {
        // MessagingFee comes back as (nativeFee, lzTokenFee)
        let call = self
            .contract
            .method::<_, (U256, U256)>(
                "quoteSend",
                (bindings::SendParam::from(param), pay_in_lz_token),
            )
            .map_err(|e| ContractError::InvalidResponse(e.to_string()))?;
        let (native_fee, lz_token_fee) = call.call().await.map_err(call_error)?;
        Ok(domain::MessagingFee { native_fee, lz_token_fee })
    }

    async fn approve(&self, spender: Address, token_id: U256) -> Result<TxHash, ContractError> {
        let call = self.contract.approve(spender, token_id);
        let pending = call.send().await.map_err(call_error)?;
        let tx = pending.tx_hash();
        debug!(tx_hash = %format_tx_hash(&tx), "approve submitted");
        Ok(tx)
    }

    async fn send(
        &self,
        param: &domain::SendParam,
        fee: domain::MessagingFee,
        refund_address: Address,
    ) -> Result<TxHash, ContractError> {
        let call =
            self.contract.send(param.into(), fee.into(), refund_address).value(fee.native_fee);
        let pending = call.send().await.map_err(call_error)?;
        let tx = pending.tx_hash();
        debug!(tx_hash = %format_tx_hash(&tx), "send submitted");
        Ok(tx)
    }

    async fn set_bridged_token_uri(
        &self,
        token_id: U256,
        uri: &str,
    ) -> Result<TxHash, ContractError> {
        let call = self.contract.set_bridged_token_uri(token_id, uri.to_string());
        let pending = call.send().await.map_err(call_error)?;
        let tx = pending.tx_hash();
        debug!(tx_hash = %format_tx_hash(&tx), "setBridgedTokenURI submitted");
        Ok(tx)
    }

    async fn wait_for_confirmations(
        &self,
        tx: TxHash,
        confirmations: usize,
    ) -> Result<(), ContractError> {
        let receipt = PendingTransaction::new(tx, self.client.provider())
            .confirmations(confirmations)
            .await
            .map_err(|e| ContractError::Provider(e.to_string()))?;

        match receipt {
            Some(r) if r.status == Some(U64::from(1)) => Ok(()),
            Some(_) => {
                warn!(tx_hash = %format_tx_hash(&tx), "transaction reverted");
                Err(ContractError::Reverted(format!("transaction {} reverted", format_tx_hash(&tx))))
            }
            None => Err(ContractError::Dropped(format_tx_hash(&tx))),
        }
    }
}
