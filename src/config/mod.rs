//! Configuration Management Module
//!
//! This module handles loading and managing configuration for the swap gateway.
//! Configuration includes API settings, the accepted swap sizes and the
//! optional price feed.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::swap_size::SwapSize;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "SWAP_GATEWAY_CONFIG_PATH";

/// Config file used when no override is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/swap_gateway.toml";

/// Default JSON body limit (100 KiB).
pub const DEFAULT_MAX_BODY_BYTES: u64 = 100 * 1024;

/// Default per-request timeout for price feed calls.
pub const DEFAULT_PRICE_REQUEST_TIMEOUT_MS: u64 = 5000;

fn default_max_body_bytes() -> u64 {
    DEFAULT_MAX_BODY_BYTES
}

fn default_price_request_timeout_ms() -> u64 {
    DEFAULT_PRICE_REQUEST_TIMEOUT_MS
}

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure containing all service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration (host, port, body limit)
    pub api: ApiConfig,
    /// Swap request policy
    pub swap: SwapConfig,
    /// Price feed polled by the price watcher (optional)
    #[serde(default)]
    pub price_feed: Option<PriceFeedConfig>,
}

/// API server configuration for external communication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host address to bind the API server to
    pub host: String,
    /// Port number to bind the API server to
    pub port: u16,
    /// Largest accepted JSON request body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
}

/// Swap request policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapConfig {
    /// Accepted swap sizes as decimal strings (e.g. "0.1", "1", "10")
    pub supported_sizes: Vec<String>,
}

/// Price feed settings.
///
/// The watcher polls `GET {feed_url}/prices/{pair}` for every configured pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceFeedConfig {
    /// Base URL of the price feed
    pub feed_url: String,
    /// Currency pairs to watch (e.g. "BTC_USD")
    pub currency_pairs: Vec<String>,
    /// Interval between polling rounds in milliseconds
    pub polling_interval_ms: u64,
    /// Timeout for a single feed request in milliseconds
    #[serde(default = "default_price_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

// ============================================================================
// CONFIGURATION LOADING AND MANAGEMENT
// ============================================================================

impl Config {
    /// Validates the configuration.
    ///
    /// This function ensures that:
    /// - At least one swap size is configured and every size parses
    /// - No two sizes are equal after canonicalisation
    /// - The price feed (if present) has a valid URL, pairs and interval
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Configuration is valid
    /// - `Err(anyhow::Error)` - First problem found
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.swap.supported_sizes.is_empty() {
            anyhow::bail!("Configuration error: swap.supported_sizes must not be empty");
        }

        let mut seen = HashSet::new();
        for raw in &self.swap.supported_sizes {
            let size = SwapSize::parse(raw)
                .map_err(|e| anyhow::anyhow!("Configuration error: swap.supported_sizes: {}", e))?;
            if !seen.insert(size.clone()) {
                anyhow::bail!(
                    "Configuration error: swap size {} is listed more than once",
                    size
                );
            }
        }

        if let Some(price_feed) = &self.price_feed {
            url::Url::parse(&price_feed.feed_url).map_err(|e| {
                anyhow::anyhow!(
                    "Configuration error: invalid price_feed.feed_url '{}': {}",
                    price_feed.feed_url,
                    e
                )
            })?;
            if price_feed.currency_pairs.is_empty() {
                anyhow::bail!("Configuration error: price_feed.currency_pairs must not be empty");
            }
            if price_feed.polling_interval_ms == 0 {
                anyhow::bail!("Configuration error: price_feed.polling_interval_ms must be positive");
            }
        }

        Ok(())
    }

    /// Loads configuration from the TOML file.
    ///
    /// The path is taken from `SWAP_GATEWAY_CONFIG_PATH` if set, otherwise
    /// `config/swap_gateway.toml`.
    ///
    /// # Returns
    ///
    /// - `Ok(Config)` - Successfully loaded and validated configuration
    /// - `Err(anyhow::Error)` - File missing, unparsable or invalid
    pub fn load() -> anyhow::Result<Self> {
        let config_path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&config_path)
    }

    /// Loads and validates configuration from an explicit path.
    pub fn load_from(config_path: &str) -> anyhow::Result<Self> {
        if !std::path::Path::new(config_path).exists() {
            return Err(anyhow::anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/swap_gateway.template.toml config/swap_gateway.toml\n\
                Then edit config/swap_gateway.toml with your actual values.",
                config_path
            ));
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Creates a default configuration suitable for local development.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            },
            swap: SwapConfig {
                supported_sizes: vec!["0.1".to_string(), "1".to_string(), "10".to_string()],
            },
            price_feed: None,
        }
    }
}
