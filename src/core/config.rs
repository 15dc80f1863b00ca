use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ethers::types::Address;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::errors::BridgeError;

pub const SEPOLIA_CHAIN_ID: u64 = 11155111;
pub const FUJI_CHAIN_ID: u64 = 43113;

/// Bridge workflow tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSettings {
    /// Blocks to wait on approve/send/restore transactions
    #[serde(default = "BridgeSettings::default_confirmations")]
    pub confirmations: usize,

    /// Delay between destination ownership checks (seconds)
    #[serde(default = "BridgeSettings::default_restore_poll_interval_secs")]
    pub restore_poll_interval_secs: u64,

    /// Ownership checks before restoration gives up
    #[serde(default = "BridgeSettings::default_restore_max_attempts")]
    pub restore_max_attempts: u32,

    /// Upper bound on a single confirmation wait (seconds)
    #[serde(default = "BridgeSettings::default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,

    /// How long the completed steps stay visible (milliseconds)
    #[serde(default = "BridgeSettings::default_success_display_delay_ms")]
    pub success_display_delay_ms: u64,

    /// How long the success message stays before state is cleared (milliseconds)
    #[serde(default = "BridgeSettings::default_status_clear_delay_ms")]
    pub status_clear_delay_ms: u64,

    /// How long the restoration success message stays (milliseconds)
    #[serde(default = "BridgeSettings::default_restore_clear_delay_ms")]
    pub restore_clear_delay_ms: u64,
}

impl BridgeSettings {
    fn default_confirmations() -> usize { 2 }
    fn default_restore_poll_interval_secs() -> u64 { 3 }
    fn default_restore_max_attempts() -> u32 { 20 }
    fn default_confirmation_timeout_secs() -> u64 { 600 }
    fn default_success_display_delay_ms() -> u64 { 1000 }
    fn default_status_clear_delay_ms() -> u64 { 5000 }
    fn default_restore_clear_delay_ms() -> u64 { 3000 }

    pub fn restore_poll_interval(&self) -> Duration {
        Duration::from_secs(self.restore_poll_interval_secs)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn success_display_delay(&self) -> Duration {
        Duration::from_millis(self.success_display_delay_ms)
    }

    pub fn status_clear_delay(&self) -> Duration {
        Duration::from_millis(self.status_clear_delay_ms)
    }

    pub fn restore_clear_delay(&self) -> Duration {
        Duration::from_millis(self.restore_clear_delay_ms)
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            confirmations: Self::default_confirmations(),
            restore_poll_interval_secs: Self::default_restore_poll_interval_secs(),
            restore_max_attempts: Self::default_restore_max_attempts(),
            confirmation_timeout_secs: Self::default_confirmation_timeout_secs(),
            success_display_delay_ms: Self::default_success_display_delay_ms(),
            status_clear_delay_ms: Self::default_status_clear_delay_ms(),
            restore_clear_delay_ms: Self::default_restore_clear_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    #[default]
    File,
    Sqlite,
    Memory,
}

/// Pending-transfer ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub backend: LedgerBackend,

    /// JSON file used by the `file` backend
    #[serde(default = "LedgerConfig::default_path")]
    pub path: PathBuf,

    /// Connection string used by the `sqlite` backend
    #[serde(default = "LedgerConfig::default_database_url")]
    pub database_url: String,

    /// Entries older than this are ignored
    #[serde(default = "LedgerConfig::default_ttl_days")]
    pub ttl_days: i64,
}

impl LedgerConfig {
    fn default_path() -> PathBuf { PathBuf::from("./data/pending_bridge_uris.json") }
    fn default_database_url() -> String { "sqlite://./data/pending_bridge.db?mode=rwc".to_string() }
    fn default_ttl_days() -> i64 { 7 }

    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.ttl_days)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: LedgerBackend::default(),
            path: Self::default_path(),
            database_url: Self::default_database_url(),
            ttl_days: Self::default_ttl_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpfsConfig {
    #[serde(default = "IpfsConfig::default_gateway")]
    pub gateway: String,
}

impl IpfsConfig {
    fn default_gateway() -> String { "https://gateway.pinata.cloud/ipfs/".to_string() }
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self { gateway: Self::default_gateway() }
    }
}

/// One network the MintX contract is deployed on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainConfig {
    pub name: String,
    pub chain_id: u64,
    /// LayerZero endpoint id
    pub eid: u32,
    pub rpc_url: String,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default = "ChainConfig::default_native_symbol")]
    pub native_symbol: String,
}

impl ChainConfig {
    fn default_native_symbol() -> String { "ETH".to_string() }
}

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub bridge: BridgeSettings,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub ipfs: IpfsConfig,
    #[serde(default = "default_chains")]
    pub chains: HashMap<String, ChainConfig>,
}

fn default_chains() -> HashMap<String, ChainConfig> {
    let mut chains = HashMap::with_capacity(2);

    chains.insert("sepolia".to_string(), ChainConfig {
        name: "Sepolia".to_string(),
        chain_id: SEPOLIA_CHAIN_ID,
        eid: 40161,
        rpc_url: "https://sepolia.drpc.org".to_string(),
        contract_address: None,
        native_symbol: "ETH".to_string(),
    });

    chains.insert("fuji".to_string(), ChainConfig {
        name: "Avalanche Fuji".to_string(),
        chain_id: FUJI_CHAIN_ID,
        eid: 40106,
        rpc_url: "https://api.avax-test.network/ext/bc/C/rpc".to_string(),
        contract_address: None,
        native_symbol: "AVAX".to_string(),
    });

    chains
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bridge: BridgeSettings::default(),
            ledger: LedgerConfig::default(),
            ipfs: IpfsConfig::default(),
            chains: default_chains(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document; absent sections fall back to defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, BridgeError> {
        let mut config: AppConfig = toml::from_str(content)
            .map_err(|e| BridgeError::Config(format!("Invalid config: {}", e)))?;
        if config.chains.is_empty() {
            config.chains = default_chains();
        }
        Ok(config)
    }

    /// Load from `path`, or fall back to defaults when the file is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content).unwrap_or_else(|e| {
                warn!("Failed to parse {}: {}. Using default configuration", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                warn!("Failed to load {}: {}. Using default configuration", path.display(), e);
                Self::default()
            }
        };

        if let Ok(gateway) = std::env::var("IPFS_GATEWAY") {
            if !gateway.trim().is_empty() {
                config.ipfs.gateway = gateway.trim().to_string();
            }
        }

        info!("Loaded configuration with {} chains", config.chains.len());
        config
    }

    pub fn chain_by_name(&self, name: &str) -> Result<&ChainConfig, BridgeError> {
        self.chains
            .get(name)
            .ok_or_else(|| BridgeError::Config(format!("Unknown chain '{}'", name)))
    }

    pub fn registry(&self) -> ChainRegistry {
        ChainRegistry::new(self.chains.values().cloned())
    }
}

/// Chain-id indexed view over the configured networks.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: HashMap<u64, ChainConfig>,
}

impl ChainRegistry {
    pub fn new(chains: impl IntoIterator<Item = ChainConfig>) -> Self {
        Self { chains: chains.into_iter().map(|c| (c.chain_id, c)).collect() }
    }

    pub fn get(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.get(&chain_id)
    }

    /// LayerZero endpoint id for a chain.
    pub fn endpoint_id(&self, chain_id: u64) -> Result<u32, BridgeError> {
        self.get(chain_id).map(|c| c.eid).ok_or(BridgeError::UnsupportedChain(chain_id))
    }
}
