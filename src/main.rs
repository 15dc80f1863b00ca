// src/main.rs
//! MintX bridge CLI entry point
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use mintx_bridge::blockchain::bridge::{
    self, BridgeOrchestrator, BRIDGE_SUCCESS_STATUS, RESTORE_SUCCESS_STATUS,
};
use mintx_bridge::blockchain::EthersNftContract;
use mintx_bridge::cli::{format_nfts, format_pending, format_progress, Cli, Commands};
use mintx_bridge::core::config::{AppConfig, ChainConfig};
use mintx_bridge::core::domain::format_tx_hash;
use mintx_bridge::core::errors::BridgeError;
use mintx_bridge::nft::{HttpMetadataFetcher, NftCatalog};
use mintx_bridge::storage::{open_store, PendingTransferLedger};
use secrecy::SecretString;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging()?;

    info!("Starting MintX bridge v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load_or_default(&cli.config_path());
    let chain = config.chain_by_name(&cli.chain)?.clone();

    let store = open_store(&config.ledger).await?;
    let ledger = Arc::new(PendingTransferLedger::new(store).with_ttl(config.ledger.ttl()));

    // Ledger-only commands need no signer.
    match &cli.command {
        Commands::Pending => {
            let entries = ledger.list_active_for(chain.chain_id).await;
            println!("{}", format_pending(&entries, chrono::Utc::now()));
            return Ok(());
        }
        Commands::Discard { token_id } => {
            let canonical = mintx_bridge::core::domain::parse_token_id(token_id)?.to_string();
            ledger.remove(&canonical, chain.chain_id).await;
            println!("Discarded pending transfer for token {}", canonical);
            return Ok(());
        }
        Commands::Prune => {
            let dropped = ledger.prune_expired().await;
            println!("Pruned {} expired pending transfers", dropped);
            return Ok(());
        }
        _ => {}
    }

    let contract = Arc::new(connect(&chain).await?);
    let wallet = contract.wallet_address();

    match cli.command {
        Commands::Nfts => {
            let fetcher = Arc::new(HttpMetadataFetcher::new(Duration::from_secs(15))?);
            let catalog = NftCatalog::new(contract, fetcher, config.ipfs.gateway.clone());
            let nfts = catalog.fetch_owned_nfts(wallet).await.map_err(user_error)?;
            println!("{}", format_nfts(&nfts));
        }
        Commands::Bridge { token_id, to } => {
            let destination = config.chain_by_name(&to)?.chain_id;
            let orchestrator =
                BridgeOrchestrator::new(contract, ledger, config.registry(), config.bridge.clone())
                    .with_wallet(Some(wallet));
            let printer = spawn_progress_printer(&orchestrator);

            let receipt = bridge::bridge_nft(&orchestrator, &token_id, destination)
                .await
                .map_err(|e| anyhow::anyhow!("Bridging failed: {}", e.user_message()))?;
            printer.abort();

            println!("{}", format_progress(&orchestrator.progress()));
            println!("send tx: {}", format_tx_hash(&receipt.send_tx));
            println!("{}", BRIDGE_SUCCESS_STATUS);
        }
        Commands::Restore { token_id } => {
            let orchestrator =
                BridgeOrchestrator::new(contract, ledger, config.registry(), config.bridge.clone())
                    .with_wallet(Some(wallet));
            let printer = spawn_progress_printer(&orchestrator);

            let receipt =
                bridge::restore_pending(&orchestrator, &token_id).await.map_err(user_error)?;
            printer.abort();

            println!("restore tx: {}", format_tx_hash(&receipt.tx));
            println!("{}", RESTORE_SUCCESS_STATUS);
        }
        Commands::Pending | Commands::Discard { .. } | Commands::Prune => {}
    }

    Ok(())
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=info,ethers_providers=warn"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn connect(chain: &ChainConfig) -> Result<EthersNftContract<mintx_bridge::blockchain::ethereum::SignerClient>> {
    let key = std::env::var("MINTX_PRIVATE_KEY")
        .context("MINTX_PRIVATE_KEY must be set to sign transactions")?;
    let key = SecretString::new(key);
    EthersNftContract::connect(chain, &key).await
}

fn spawn_progress_printer(orchestrator: &BridgeOrchestrator) -> tokio::task::JoinHandle<()> {
    let mut rx = orchestrator.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            eprintln!("{}\n", format_progress(&snapshot));
        }
    })
}

fn user_error(e: BridgeError) -> anyhow::Error {
    anyhow::anyhow!(e.user_message())
}
