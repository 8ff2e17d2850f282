//! Price Watcher Module
//!
//! Defines the price lookup contract used by `/prices/:currencyPair` and a
//! polling watcher that caches the latest payload per currency pair.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::PriceFeedConfig;

// ============================================================================
// WATCHER CONTRACT
// ============================================================================

/// Collaborator that keeps current prices for currency pairs.
#[async_trait]
pub trait PriceWatcher: Send + Sync {
    /// Begins background price collection. Called once after the listener is bound.
    async fn start_watching(&self) -> Result<()>;

    /// Latest price payload for `currency_pair`, or `None` if unknown.
    async fn retrieve_prices(&self, currency_pair: &str) -> Result<Option<Value>>;
}

// ============================================================================
// POLLING WATCHER
// ============================================================================

type PriceCache = Arc<RwLock<HashMap<String, Value>>>;

/// Price watcher that polls an HTTP price feed.
///
/// Without a feed configuration the watcher never reports prices.
pub struct PollingPriceWatcher {
    feed: Option<PriceFeedConfig>,
    client: reqwest::Client,
    /// Map of currency pair -> latest payload
    prices: PriceCache,
    started: AtomicBool,
}

impl PollingPriceWatcher {
    /// Creates a watcher for the given feed.
    ///
    /// # Arguments
    ///
    /// * `feed` - Price feed settings, or `None` to disable price collection
    ///
    /// # Returns
    ///
    /// * `Ok(PollingPriceWatcher)` - Watcher ready to start
    /// * `Err(anyhow::Error)` - HTTP client could not be built
    pub fn new(feed: Option<PriceFeedConfig>) -> Result<Self> {
        let timeout_ms = feed
            .as_ref()
            .map(|feed| feed.request_timeout_ms)
            .unwrap_or(crate::config::DEFAULT_PRICE_REQUEST_TIMEOUT_MS);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .context("Failed to build price feed HTTP client")?;

        Ok(Self {
            feed,
            client,
            prices: Arc::new(RwLock::new(HashMap::new())),
            started: AtomicBool::new(false),
        })
    }

    /// Runs one polling round over every configured pair.
    ///
    /// Pairs the feed reports as missing, or that fail to fetch, are removed
    /// from the cache so stale prices are never served.
    pub async fn refresh(&self) {
        if let Some(feed) = &self.feed {
            refresh_all(&self.client, feed, &self.prices).await;
        }
    }
}

/// Fetches the current payload for one pair.
///
/// # Returns
///
/// * `Ok(Some(Value))` - Feed returned a price payload
/// * `Ok(None)` - Feed does not know the pair (404)
/// * `Err(anyhow::Error)` - Request failed or the feed returned an error status
async fn fetch_prices(
    client: &reqwest::Client,
    feed_url: &str,
    currency_pair: &str,
) -> Result<Option<Value>> {
    let url = format!("{}/prices/{}", feed_url.trim_end_matches('/'), currency_pair);
    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Price feed request to {} failed", url))?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        anyhow::bail!("Price feed returned error status {} for {}", status, currency_pair);
    }

    let payload: Value = response
        .json()
        .await
        .with_context(|| format!("Invalid price feed response for {}", currency_pair))?;
    Ok(Some(payload))
}

async fn refresh_all(client: &reqwest::Client, feed: &PriceFeedConfig, prices: &PriceCache) {
    for pair in &feed.currency_pairs {
        match fetch_prices(client, &feed.feed_url, pair).await {
            Ok(Some(payload)) => {
                debug!("Updated prices for {}", pair);
                prices.write().await.insert(pair.clone(), payload);
            }
            Ok(None) => {
                debug!("Price feed has no prices for {}", pair);
                prices.write().await.remove(pair);
            }
            Err(e) => {
                warn!("Failed to refresh prices for {}: {:#}", pair, e);
                prices.write().await.remove(pair);
            }
        }
    }
}

#[async_trait]
impl PriceWatcher for PollingPriceWatcher {
    async fn start_watching(&self) -> Result<()> {
        let Some(feed) = self.feed.clone() else {
            info!("No price feed configured; price queries will report no data");
            return Ok(());
        };

        if self.started.swap(true, Ordering::SeqCst) {
            warn!("Price watcher already started");
            return Ok(());
        }

        info!(
            "Watching {} currency pairs every {}ms",
            feed.currency_pairs.len(),
            feed.polling_interval_ms
        );

        let client = self.client.clone();
        let prices = self.prices.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(feed.polling_interval_ms));
            loop {
                interval.tick().await;
                refresh_all(&client, &feed, &prices).await;
            }
        });

        Ok(())
    }

    async fn retrieve_prices(&self, currency_pair: &str) -> Result<Option<Value>> {
        Ok(self.prices.read().await.get(currency_pair).cloned())
    }
}
