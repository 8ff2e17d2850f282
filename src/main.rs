//! Swap Gateway Service
//!
//! HTTP front door for the multi-currency swap service.
//!
//! ## Overview
//!
//! The gateway:
//! 1. Accepts deposit and withdraw swap requests per currency
//! 2. Stores and serves refund transactions by content hash
//! 3. Serves the latest prices collected by the price watcher
//!
//! Matching, refund storage and price collection are delegated to
//! collaborators; the gateway only validates, routes and translates.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use swap_gateway::config::{Config, CONFIG_PATH_ENV};
use swap_gateway::{
    ApiServer, CurrencyRegistry, InMemoryMatchingEngine, InMemoryRefundStore, MatchingEngine,
    PollingPriceWatcher,
};

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

/// Main application entry point that initializes and runs the gateway.
///
/// This function:
/// 1. Initializes logging and tracing
/// 2. Loads configuration from TOML file
/// 3. Builds one matching engine per supported currency
/// 4. Binds the API server, starts price watching and serves requests
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    info!("Starting Swap Gateway");

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("Swap Gateway");
        println!();
        println!("Usage: swap-gateway [OPTIONS]");
        println!();
        println!("Options:");
        println!("  --config <path>   Use custom config file path");
        println!("  --help, -h        Show this help message");
        println!();
        println!("Environment variables:");
        println!("  {}    Path to config file (overrides --config)", CONFIG_PATH_ENV);
        return Ok(());
    }

    let config = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => {
            info!("Using config from {}: {}", CONFIG_PATH_ENV, path);
            Config::load_from(&path)?
        }
        Err(_) => {
            let custom_path = args
                .iter()
                .position(|arg| arg == "--config")
                .and_then(|i| args.get(i + 1));
            match custom_path {
                Some(path) => {
                    info!("Using custom config: {}", path);
                    Config::load_from(path)?
                }
                None => Config::load()?,
            }
        }
    };
    info!("Configuration loaded successfully");

    let registry = CurrencyRegistry::new(|currency| {
        info!("Initializing matching engine for {}", currency);
        Arc::new(InMemoryMatchingEngine::new(currency)) as Arc<dyn MatchingEngine>
    });
    let refund_store = Arc::new(InMemoryRefundStore::new());
    let price_watcher = Arc::new(PollingPriceWatcher::new(config.price_feed.clone())?);

    let api_server = ApiServer::new(config, registry, refund_store, price_watcher)?;

    // Run the service (this blocks until shutdown)
    api_server.run().await?;

    Ok(())
}
