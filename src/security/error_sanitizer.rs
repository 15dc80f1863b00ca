//! Error message sanitizing
//!
//! Wallet and RPC errors carry calldata, revert payloads and request dumps. Only a
//! short human-readable summary may reach the user; the raw text stays in the logs.

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest raw message passed through unchanged.
const MAX_PLAIN_MESSAGE_LEN: usize = 150;

/// Patterns that must never be shown, even inside an otherwise readable message.
static SENSITIVE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        // Private key (32 bytes = 64 hex chars)
        (Regex::new(r"0x[0-9a-fA-F]{64}").expect("valid regex"), "[REDACTED_PRIVATE_KEY]"),
        // Mnemonic (12/24 words)
        (
            Regex::new(r"\b([a-z]{3,8}\s+){11,23}[a-z]{3,8}\b").expect("valid regex"),
            "[REDACTED_MNEMONIC]",
        ),
        // API keys embedded in RPC URLs
        (
            Regex::new(r"(?i)(https?://[^\s/]+/v[23]/)[a-zA-Z0-9_-]{16,}").expect("valid regex"),
            "${1}[REDACTED]",
        ),
    ]
});

static HEX_BLOB: Lazy<Regex> = Lazy::new(|| Regex::new(r"0x[a-fA-F0-9]+").expect("valid regex"));
static REQUEST_ARGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)Request Arguments:.*?Details:").expect("valid regex"));
static DETAILS_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)Details:.*$").expect("valid regex"));

/// Redact secrets from a message while keeping the rest intact (for logs).
pub fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = message.to_string();
    for (pattern, replacement) in SENSITIVE_PATTERNS.iter() {
        sanitized = pattern.replace_all(&sanitized, *replacement).to_string();
    }
    sanitized
}

/// Map a raw chain/wallet error to the text shown to the user.
pub fn user_facing_message(raw: &str) -> String {
    let message = if raw.trim().is_empty() { "Unknown error" } else { raw };

    if message.contains("User rejected") || message.contains("User denied") {
        return "You cancelled the transaction in your wallet.".to_string();
    }

    if message.contains("insufficient funds") {
        return "Insufficient funds to complete the transaction. Please add more ETH to your wallet."
            .to_string();
    }

    if message.contains("network") || message.contains("Network") {
        return "Network error. Please check your connection and try again.".to_string();
    }

    if message.contains("gas") || message.contains("Gas") {
        return "Transaction failed. This might be due to insufficient gas or a contract issue."
            .to_string();
    }

    if message.contains("TransactionExecutionError")
        || message.contains("Error:")
        || message.contains("reverted")
    {
        let without_hex = HEX_BLOB.replace_all(message, "");
        let without_args = REQUEST_ARGS.replace_all(&without_hex, "");
        let clean = DETAILS_TAIL.replace_all(&without_args, "");
        if clean.contains("User denied") {
            return "You cancelled the transaction in your wallet.".to_string();
        }
        return "Transaction failed. Please try again.".to_string();
    }

    if message.len() > MAX_PLAIN_MESSAGE_LEN {
        return "An error occurred. Please try again.".to_string();
    }

    sanitize_error_message(message)
}
