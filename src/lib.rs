//! Swap Gateway Library
//!
//! This crate provides the HTTP front door of a multi-currency swap service.
//! It validates swap, refund and price requests and routes them to
//! per-currency matching engines, the refund transaction store and the
//! price watcher.

pub mod api;
pub mod config;
pub mod currency;
pub mod matching_engine;
pub mod price_watcher;
pub mod storage;
pub mod structs;
pub mod swap_size;

// Re-export commonly used types
pub use api::{ApiError, ApiServer};
pub use config::{ApiConfig, Config, PriceFeedConfig, SwapConfig};
pub use currency::{Currency, CurrencyRegistry, ResolvedCurrency, UnsupportedCurrency};
pub use matching_engine::{AcceptedSwapReq, InMemoryMatchingEngine, MatchingEngine, SwapInfo, SwapReqId};
pub use price_watcher::{PollingPriceWatcher, PriceWatcher};
pub use storage::{InMemoryRefundStore, RefundStore, StoredRefundTx};
pub use structs::{DepositRequest, StoreRefundTxRequest, SwapRequest, ValidationError, WithdrawRequest};
pub use swap_size::{SwapSize, SwapSizePolicy};
