//! Token metadata documents.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The parts of an ERC-721 metadata document the bridge cares about.
///
/// Unknown fields are kept in `extra` so the raw document survives a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("HTTP error! Status: {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Fetches a metadata document from a resolved URL.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<TokenMetadata, MetadataError>;
}

pub struct HttpMetadataFetcher {
    client: reqwest::Client,
}

impl HttpMetadataFetcher {
    pub fn new(timeout: Duration) -> Result<Self, MetadataError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch(&self, url: &str) -> Result<TokenMetadata, MetadataError> {
        debug!(url, "fetching token metadata");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(MetadataError::Status(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }
}
