// src/core/domain.rs
//! Value types shared by the contract seam and the bridge workflow.

use ethers::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};

use crate::core::errors::BridgeError;

/// Fee pair returned by `quoteSend`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagingFee {
    pub native_fee: U256,
    pub lz_token_fee: U256,
}

/// Arguments of an ONFT `send`/`quoteSend` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendParam {
    pub dst_eid: u32,
    /// Recipient address left-padded to 32 bytes.
    pub to: [u8; 32],
    pub token_id: U256,
    pub extra_options: Bytes,
    pub compose_msg: Bytes,
    pub onft_cmd: Bytes,
}

impl SendParam {
    /// Plain transfer to `recipient` with no options, compose message or command.
    pub fn transfer(dst_eid: u32, recipient: Address, token_id: U256) -> Self {
        Self {
            dst_eid,
            to: address_to_bytes32(recipient),
            token_id,
            extra_options: Bytes::new(),
            compose_msg: Bytes::new(),
            onft_cmd: Bytes::new(),
        }
    }
}

/// Hash of a submitted transaction.
pub type TxHash = H256;

pub fn address_to_bytes32(address: Address) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[12..].copy_from_slice(address.as_bytes());
    out
}

/// Parse a token id in its decimal string form.
pub fn parse_token_id(value: &str) -> Result<U256, BridgeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(BridgeError::Validation(format!("Invalid token id: {}", value)));
    }
    U256::from_dec_str(trimmed)
        .map_err(|_| BridgeError::Validation(format!("Token id out of range: {}", value)))
}

/// 0x-prefixed lowercase hex of a transaction hash, for logs and receipts.
pub fn format_tx_hash(hash: &TxHash) -> String {
    format!("0x{}", hex::encode(hash.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_address_left_padded() {
        let addr = Address::from_str("0x1111111111111111111111111111111111111111").unwrap();
        let word = address_to_bytes32(addr);
        assert!(word[..12].iter().all(|&b| b == 0));
        assert!(word[12..].iter().all(|&b| b == 0x11));
    }

    #[test]
    fn test_transfer_param() {
        let param = SendParam::transfer(40106, Address::zero(), U256::from(7u64));
        assert_eq!(param.dst_eid, 40106);
        assert!(param.extra_options.is_empty());
        assert!(param.compose_msg.is_empty());
        assert!(param.onft_cmd.is_empty());
    }

    #[test]
    fn test_parse_token_id() {
        assert_eq!(parse_token_id("7").unwrap(), U256::from(7u64));
        assert_eq!(parse_token_id(" 42 ").unwrap(), U256::from(42u64));
        assert!(parse_token_id("").is_err());
        assert!(parse_token_id("-1").is_err());
        assert!(parse_token_id("0x10").is_err());
    }

    #[test]
    fn test_format_tx_hash() {
        let hash = H256::from_low_u64_be(1);
        let s = format_tx_hash(&hash);
        assert!(s.starts_with("0x"));
        assert_eq!(s.len(), 66);
        assert!(s.ends_with('1'));
    }
}
