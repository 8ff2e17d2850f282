//! Currency Registry Module
//!
//! This module defines the static set of supported currencies and the
//! registry that maps each currency to its matching-engine handle. The
//! registry is built once at startup and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::matching_engine::MatchingEngine;

// ============================================================================
// CURRENCY ENUMERATION
// ============================================================================

/// Currencies the swap service accepts requests for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    /// Bitcoin
    #[serde(rename = "BTC")]
    Btc,
    /// Ether
    #[serde(rename = "ETH")]
    Eth,
    /// Stellar lumens
    #[serde(rename = "XLM")]
    Xlm,
}

impl Currency {
    /// Every supported currency, in the order reported by `/supportedCurrencies`.
    pub const ALL: [Currency; 3] = [Currency::Btc, Currency::Eth, Currency::Xlm];

    /// Returns the wire identifier used in URL paths and responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Btc => "BTC",
            Currency::Eth => "ETH",
            Currency::Xlm => "XLM",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookup outcome for a currency identifier that is not in [`Currency::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported currency: {0}")]
pub struct UnsupportedCurrency(pub String);

impl FromStr for Currency {
    type Err = UnsupportedCurrency;

    /// Identifiers are matched exactly; `btc` is not `BTC`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|currency| currency.as_str() == s)
            .ok_or_else(|| UnsupportedCurrency(s.to_string()))
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// A currency together with the matching engine registered for it.
///
/// Produced per request by [`CurrencyRegistry::resolve`] and handed to the
/// swap handlers.
#[derive(Clone)]
pub struct ResolvedCurrency {
    /// Currency named in the request path
    pub currency: Currency,
    /// Matching engine registered for `currency`
    pub engine: Arc<dyn MatchingEngine>,
}

impl fmt::Debug for ResolvedCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCurrency")
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

/// Immutable mapping from every supported currency to its matching engine.
pub struct CurrencyRegistry {
    engines: HashMap<Currency, Arc<dyn MatchingEngine>>,
}

impl CurrencyRegistry {
    /// Builds the registry by invoking `make_engine` once per supported currency.
    ///
    /// # Arguments
    ///
    /// * `make_engine` - Factory producing a fresh engine scoped to the given currency
    ///
    /// # Returns
    ///
    /// A registry holding exactly one engine per entry of [`Currency::ALL`]
    pub fn new<F>(mut make_engine: F) -> Self
    where
        F: FnMut(Currency) -> Arc<dyn MatchingEngine>,
    {
        let engines = Currency::ALL
            .into_iter()
            .map(|currency| (currency, make_engine(currency)))
            .collect();
        Self { engines }
    }

    /// Resolves a path identifier to its currency and matching engine.
    ///
    /// # Arguments
    ///
    /// * `currency_id` - Raw identifier taken from the request path
    ///
    /// # Returns
    ///
    /// * `Ok(ResolvedCurrency)` - Currency is supported
    /// * `Err(UnsupportedCurrency)` - Identifier is not a supported currency
    pub fn resolve(&self, currency_id: &str) -> Result<ResolvedCurrency, UnsupportedCurrency> {
        let currency = Currency::from_str(currency_id)?;
        let engine = self
            .engines
            .get(&currency)
            .cloned()
            .ok_or_else(|| UnsupportedCurrency(currency_id.to_string()))?;
        Ok(ResolvedCurrency { currency, engine })
    }

    /// Supported currencies, in wire order.
    pub fn currencies(&self) -> Vec<Currency> {
        Currency::ALL.to_vec()
    }
}
