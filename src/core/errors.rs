use std::time::Duration;

use thiserror::Error;

use crate::blockchain::bridge::steps::StepId;
use crate::security::error_sanitizer::user_facing_message;

/// Errors raised by a contract read or write.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ContractError {
    /// The call or transaction reverted on-chain.
    #[error("execution reverted: {0}")]
    Reverted(String),
    /// RPC transport or provider failure.
    #[error("provider error: {0}")]
    Provider(String),
    /// The transaction disappeared from the mempool before it was mined.
    #[error("transaction {0} dropped from mempool")]
    Dropped(String),
    /// The node answered with something we could not use.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ContractError {
    pub fn is_revert(&self) -> bool {
        matches!(self, ContractError::Reverted(_))
    }
}

/// Errors raised by a persisted key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

/// Errors surfaced by the bridge workflow.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BridgeError {
    /// Missing wallet, token or destination; raised before any step starts.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("A bridge attempt is already in progress")]
    Busy,

    #[error("Unsupported network: chain {0}")]
    UnsupportedChain(u64),

    #[error("Failed to capture token metadata: {0}")]
    Capture(String),

    #[error("Failed to estimate fees: {0}")]
    Quote(String),

    #[error("{step} transaction failed: {message}")]
    Transaction { step: StepId, message: String },

    #[error("{step} transaction not confirmed after {waited:?}")]
    ConfirmationTimeout { step: StepId, waited: Duration },

    /// The token did not show up on the destination chain within the poll budget.
    #[error(
        "Token {token_id} has not arrived on destination chain yet after {attempts} checks. Please wait a few more minutes and try again."
    )]
    RestoreTimeout { token_id: String, attempts: u32 },

    #[error("Failed to restore metadata: {0}")]
    RestoreWrite(String),

    #[error("Metadata restore for token {token_id} not confirmed after {waited:?}")]
    RestoreConfirmationTimeout { token_id: String, waited: Duration },

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BridgeError {
    /// Retry makes sense without changing anything on the caller side.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BridgeError::RestoreTimeout { .. }
                | BridgeError::RestoreWrite(_)
                | BridgeError::Quote(_)
                | BridgeError::Capture(_)
                | BridgeError::ConfirmationTimeout { .. }
                | BridgeError::RestoreConfirmationTimeout { .. }
                | BridgeError::Busy
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            BridgeError::RestoreTimeout { .. }
                | BridgeError::ConfirmationTimeout { .. }
                | BridgeError::RestoreConfirmationTimeout { .. }
        )
    }

    /// Human-readable text with technical details stripped.
    pub fn user_message(&self) -> String {
        match self {
            BridgeError::Validation(msg) => msg.clone(),
            BridgeError::Busy | BridgeError::UnsupportedChain(_) => self.to_string(),
            BridgeError::RestoreTimeout { .. } => {
                "Token has not arrived on destination chain yet. Please wait a few more minutes and try again."
                    .to_string()
            }
            BridgeError::Transaction { message, .. } => user_facing_message(message),
            BridgeError::Quote(msg) => format!("Failed to estimate fees: {}", user_facing_message(msg)),
            BridgeError::Capture(msg) => {
                format!("Failed to capture token metadata: {}", user_facing_message(msg))
            }
            BridgeError::RestoreWrite(msg)
            | BridgeError::Contract(msg)
            | BridgeError::Config(msg) => user_facing_message(msg),
            BridgeError::ConfirmationTimeout { .. } | BridgeError::RestoreConfirmationTimeout { .. } => {
                "Transaction was not confirmed in time. Check your wallet activity before retrying."
                    .to_string()
            }
        }
    }
}

impl From<ContractError> for BridgeError {
    fn from(err: ContractError) -> Self {
        BridgeError::Contract(err.to_string())
    }
}
