// src/nft/mod.rs
//! Owned-NFT listing for the bridge selection.

pub mod ipfs;
pub mod metadata;

use std::sync::Arc;

use ethers::types::{Address, U256};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::blockchain::traits::NftBridgeContract;
use crate::core::errors::BridgeError;

pub use ipfs::gateway_url;
pub use metadata::{HttpMetadataFetcher, MetadataError, MetadataFetcher, TokenMetadata};

/// One selectable token. Derived from chain and IPFS reads, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NftOption {
    pub token_id: String,
    /// Metadata name, or `Token #<id>` when there is none.
    pub label: String,
    pub has_uri: bool,
    pub image_url: Option<String>,
    pub metadata: Option<TokenMetadata>,
}

pub struct NftCatalog {
    contract: Arc<dyn NftBridgeContract>,
    fetcher: Arc<dyn MetadataFetcher>,
    gateway: String,
}

impl NftCatalog {
    pub fn new(
        contract: Arc<dyn NftBridgeContract>,
        fetcher: Arc<dyn MetadataFetcher>,
        gateway: impl Into<String>,
    ) -> Self {
        Self { contract, fetcher, gateway: gateway.into() }
    }

    /// List tokens held by `owner` on the connected chain.
    ///
    /// A token whose id or URI cannot be read is skipped. A token whose metadata
    /// cannot be fetched is kept under its default label.
    pub async fn fetch_owned_nfts(&self, owner: Address) -> Result<Vec<NftOption>, BridgeError> {
        let chain_id = self.contract.chain_id();
        if !self.contract.is_deployed().await? {
            return Err(BridgeError::Contract("Contract not found at the specified address".into()));
        }

        let count = self.contract.balance_of(owner).await?;
        info!(chain_id, ?owner, count = %count, "Fetching owned NFTs");
        if count.is_zero() {
            return Ok(Vec::new());
        }

        let mut options = Vec::new();
        let mut index = U256::zero();
        while index < count {
            match self.load_token(owner, index).await {
                Ok(option) => options.push(option),
                Err(e) => warn!(chain_id, index = %index, "Error fetching token: {}", e),
            }
            index += U256::one();
        }
        Ok(options)
    }

    async fn load_token(&self, owner: Address, index: U256) -> Result<NftOption, BridgeError> {
        let token_id = self.contract.token_of_owner_by_index(owner, index).await?;
        let uri = self.contract.token_uri(token_id).await?;
        let has_uri = !uri.is_empty();

        let mut option = NftOption {
            token_id: token_id.to_string(),
            label: format!("Token #{}", token_id),
            has_uri,
            image_url: None,
            metadata: None,
        };
        if !has_uri {
            debug!(token_id = %token_id, "token has no URI");
            return Ok(option);
        }

        let url = gateway_url(&self.gateway, &uri);
        match self.fetcher.fetch(&url).await {
            Ok(metadata) => {
                if let Some(name) = metadata.name.as_deref().filter(|n| !n.is_empty()) {
                    option.label = name.to_string();
                }
                option.image_url = metadata
                    .image
                    .as_deref()
                    .filter(|i| !i.is_empty())
                    .map(|i| gateway_url(&self.gateway, i));
                option.metadata = Some(metadata);
            }
            Err(e) => warn!(token_id = %token_id, url = %url, "Error fetching metadata: {}", e),
        }
        Ok(option)
    }
}
