use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use crate::blockchain::bridge::{BridgeProgress, StepStatus};
use crate::nft::NftOption;
use crate::storage::PendingTransfer;

/// MintX bridge CLI (library-facing definitions)
#[derive(Debug, Parser)]
#[command(
    name = "mintx-bridge",
    about = "Bridge MintX NFTs between chains and restore their metadata",
    version,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Config file; falls back to CONFIG_PATH, then config.toml
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Configured chain the wallet is on
    #[arg(long, default_value = "sepolia")]
    pub chain: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Commands {
    /// List NFTs owned by the wallet
    Nfts,
    /// Bridge a token to another configured chain
    Bridge {
        #[arg(long)]
        token_id: String,
        /// Destination chain name
        #[arg(long)]
        to: String,
    },
    /// Show transfers waiting for restoration on this chain
    Pending,
    /// Restore metadata of a token that has arrived on this chain
    Restore {
        #[arg(long)]
        token_id: String,
    },
    /// Forget a pending transfer without restoring it
    Discard {
        #[arg(long)]
        token_id: String,
    },
    /// Drop expired pending transfers from the store
    Prune,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| {
            PathBuf::from(std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string()))
        })
    }
}

fn step_marker(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Pending => "[ ]",
        StepStatus::Loading => "[~]",
        StepStatus::Completed => "[x]",
        StepStatus::Error => "[!]",
    }
}

/// One-line-per-step rendering of a progress snapshot.
pub fn format_progress(progress: &BridgeProgress) -> String {
    let mut lines: Vec<String> = progress
        .steps
        .iter()
        .map(|s| format!("{} {} - {}", step_marker(s.status), s.title, s.description))
        .collect();
    if let Some(status) = &progress.status {
        lines.push(status.clone());
    }
    if let Some(error) = &progress.error {
        lines.push(format!("error: {}", error));
    }
    lines.join("\n")
}

pub fn format_pending(entries: &[PendingTransfer], now: DateTime<Utc>) -> String {
    if entries.is_empty() {
        return "No pending transfers on this chain".to_string();
    }
    entries
        .iter()
        .map(|e| {
            let age = now - e.captured_at;
            format!(
                "token {} from chain {} ({}h ago): {}",
                e.token_id,
                e.source_chain_id,
                age.num_hours(),
                e.metadata_uri
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_nfts(nfts: &[NftOption]) -> String {
    if nfts.is_empty() {
        return "No NFTs found".to_string();
    }
    nfts.iter()
        .map(|n| {
            let marker = if n.has_uri { "" } else { " (no metadata)" };
            format!("#{} {}{}", n.token_id, n.label, marker)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
