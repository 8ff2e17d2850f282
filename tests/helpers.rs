//! Shared test helpers for integration tests
//!
//! The module is organized into several categories:
//! - **Constants**: Dummy addresses, refund transactions and ids
//! - **Recording Collaborators**: Matching engine, refund store and price
//!   watcher doubles that record every call they receive
//! - **Gateway Builders**: Functions assembling an `ApiServer` around the doubles

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use swap_gateway::config::Config;
use swap_gateway::{
    AcceptedSwapReq, ApiServer, Currency, CurrencyRegistry, DepositRequest, InMemoryRefundStore,
    MatchingEngine, PriceWatcher, RefundStore, StoredRefundTx, SwapInfo, SwapReqId,
    WithdrawRequest,
};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Dummy Stellar account used as refund address
pub const DUMMY_REFUND_ADDRESS: &str = "GBRPYHIL2CI3FNQ4BXLFMNDLFJUNPU2HY3ZMFSHONUCEOASW7QC7OX2H";

/// Dummy Stellar account used as withdraw destination
pub const DUMMY_DESTINATION_ADDRESS: &str =
    "GCEZWKCA5VLDNRLN3RPRJMRZOX3Z6G5CHCGSNFHEYVXM3XOJMDS674JZ";

/// Dummy base64 XDR transaction envelope
pub const DUMMY_XDR: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8gISIjJCUmJygpKissLS4v";

/// Dummy swap request id
pub const DUMMY_SWAP_REQ_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Swap size accepted by the default test configuration
pub const SUPPORTED_SWAP_SIZE: &str = "1";

/// Swap size rejected by the default test configuration
pub const UNSUPPORTED_SWAP_SIZE: &str = "5";

// ============================================================================
// CONFIGURATION BUILDERS
// ============================================================================

/// Configuration accepting swap sizes 0.1, 1 and 10 without a price feed.
pub fn build_test_config() -> Config {
    Config::default()
}

/// Valid deposit body with the given swap size.
pub fn deposit_body(swap_size: &str) -> Value {
    json!({
        "swapSize": swap_size,
        "refundAddress": DUMMY_REFUND_ADDRESS,
    })
}

/// Valid withdraw body with the given swap size.
pub fn withdraw_body(swap_size: &str) -> Value {
    json!({
        "swapSize": swap_size,
        "destinationAddress": DUMMY_DESTINATION_ADDRESS,
    })
}

// ============================================================================
// RECORDING MATCHING ENGINE
// ============================================================================

/// Call received by a [`RecordingMatchingEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    AddDeposit(DepositRequest),
    AddWithdraw(WithdrawRequest),
    GetSwapInfo(SwapReqId),
    DeleteSwapInfo(SwapReqId),
}

/// Matching engine double that records calls and replays a fixed status.
pub struct RecordingMatchingEngine {
    currency: Currency,
    calls: Mutex<Vec<EngineCall>>,
    swap_info: SwapInfo,
    fail: bool,
}

impl RecordingMatchingEngine {
    /// Engine reporting every swap as `pending`.
    pub fn new(currency: Currency) -> Self {
        let mut details = serde_json::Map::new();
        details.insert("currency".to_string(), json!(currency));
        Self::with_swap_info(
            currency,
            SwapInfo {
                status: "pending".to_string(),
                details,
            },
        )
    }

    /// Engine answering `get_swap_info` with `swap_info`.
    pub fn with_swap_info(currency: Currency, swap_info: SwapInfo) -> Self {
        Self {
            currency,
            calls: Mutex::new(Vec::new()),
            swap_info,
            fail: false,
        }
    }

    /// Engine whose every call fails.
    pub fn failing(currency: Currency) -> Self {
        Self {
            fail: true,
            ..Self::new(currency)
        }
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: EngineCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            anyhow::bail!("{} matching engine unavailable", self.currency);
        }
        Ok(())
    }

    fn next_id(&self, kind: &str) -> AcceptedSwapReq {
        let n = self.calls.lock().unwrap().len();
        AcceptedSwapReq {
            swap_req_id: SwapReqId(format!("{}-{}-{}", self.currency, kind, n)),
        }
    }
}

#[async_trait]
impl MatchingEngine for RecordingMatchingEngine {
    fn currency(&self) -> Currency {
        self.currency
    }

    async fn add_deposit_req(&self, request: DepositRequest) -> Result<AcceptedSwapReq> {
        self.record(EngineCall::AddDeposit(request))?;
        Ok(self.next_id("deposit"))
    }

    async fn add_withdraw_req(&self, request: WithdrawRequest) -> Result<AcceptedSwapReq> {
        self.record(EngineCall::AddWithdraw(request))?;
        Ok(self.next_id("withdraw"))
    }

    async fn get_swap_info(&self, swap_req_id: &SwapReqId) -> Result<SwapInfo> {
        self.record(EngineCall::GetSwapInfo(swap_req_id.clone()))?;
        Ok(self.swap_info.clone())
    }

    async fn delete_swap_info(&self, swap_req_id: &SwapReqId) -> Result<()> {
        self.record(EngineCall::DeleteSwapInfo(swap_req_id.clone()))
    }
}

// ============================================================================
// RECORDING REFUND STORE
// ============================================================================

/// Refund store double backed by the in-memory store that counts calls.
pub struct RecordingRefundStore {
    inner: InMemoryRefundStore,
    calls: AtomicUsize,
    fail: bool,
}

impl RecordingRefundStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryRefundStore::new(),
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// Store whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("refund store connection refused");
        }
        Ok(())
    }
}

#[async_trait]
impl RefundStore for RecordingRefundStore {
    async fn save(&self, xdr: &str) -> Result<StoredRefundTx> {
        self.record()?;
        self.inner.save(xdr).await
    }

    async fn retrieve(&self, hash: &str) -> Result<Option<String>> {
        self.record()?;
        self.inner.retrieve(hash).await
    }
}

// ============================================================================
// STATIC PRICE WATCHER
// ============================================================================

/// Price watcher double serving a fixed price table.
pub struct StaticPriceWatcher {
    prices: HashMap<String, Value>,
    calls: AtomicUsize,
}

impl StaticPriceWatcher {
    pub fn new(prices: HashMap<String, Value>) -> Self {
        Self {
            prices,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(HashMap::new())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceWatcher for StaticPriceWatcher {
    async fn start_watching(&self) -> Result<()> {
        Ok(())
    }

    async fn retrieve_prices(&self, currency_pair: &str) -> Result<Option<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.prices.get(currency_pair).cloned())
    }
}

// ============================================================================
// GATEWAY BUILDERS
// ============================================================================

/// API server wired to recording collaborators that tests can inspect.
pub struct TestGateway {
    pub server: ApiServer,
    pub engines: HashMap<Currency, Arc<RecordingMatchingEngine>>,
    pub refund_store: Arc<RecordingRefundStore>,
    pub price_watcher: Arc<StaticPriceWatcher>,
}

impl TestGateway {
    /// Gateway with healthy collaborators and no prices.
    pub fn new() -> Self {
        Self::build(
            build_test_config(),
            RecordingMatchingEngine::new,
            RecordingRefundStore::new(),
            StaticPriceWatcher::empty(),
        )
    }

    /// Gateway assembled from the given configuration and collaborators.
    pub fn build(
        config: Config,
        make_engine: impl Fn(Currency) -> RecordingMatchingEngine,
        refund_store: RecordingRefundStore,
        price_watcher: StaticPriceWatcher,
    ) -> Self {
        let engines: HashMap<Currency, Arc<RecordingMatchingEngine>> = Currency::ALL
            .into_iter()
            .map(|currency| (currency, Arc::new(make_engine(currency))))
            .collect();
        let registry = CurrencyRegistry::new(|currency| {
            engines[&currency].clone() as Arc<dyn MatchingEngine>
        });
        let refund_store = Arc::new(refund_store);
        let price_watcher = Arc::new(price_watcher);

        let server = ApiServer::new(
            config,
            registry,
            refund_store.clone(),
            price_watcher.clone(),
        )
        .unwrap();

        Self {
            server,
            engines,
            refund_store,
            price_watcher,
        }
    }

    /// Engine registered for `currency`.
    pub fn engine(&self, currency: Currency) -> &RecordingMatchingEngine {
        &self.engines[&currency]
    }

    /// Total number of calls across every matching engine.
    pub fn total_engine_calls(&self) -> usize {
        self.engines.values().map(|engine| engine.calls().len()).sum()
    }
}
