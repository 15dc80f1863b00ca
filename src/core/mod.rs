pub mod config;
pub mod domain;
pub mod errors;
pub mod result_ext;

pub use config::{AppConfig, BridgeSettings, ChainConfig, ChainRegistry};
pub use domain::{MessagingFee, SendParam, TxHash};
pub use errors::{BridgeError, ContractError, StorageError};
