//! Matching Engine Module
//!
//! Defines the per-currency matching engine contract consumed by the swap
//! routes, plus an in-memory engine that queues requests without pairing them.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::currency::Currency;
use crate::structs::{DepositRequest, SwapRequest, WithdrawRequest};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Identifier assigned to a swap request when an engine accepts it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwapReqId(pub String);

impl fmt::Display for SwapReqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SwapReqId {
    fn from(id: String) -> Self {
        SwapReqId(id)
    }
}

/// Result of a successful `add_deposit_req` / `add_withdraw_req` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedSwapReq {
    /// Handle for later status queries and cancellation
    pub swap_req_id: SwapReqId,
}

/// Status report for a swap request.
///
/// Only `status` is interpreted by the gateway; every other field the engine
/// returns is passed to the client unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapInfo {
    /// Engine-defined status; [`SwapInfo::NOT_FOUND`] marks unknown ids
    pub status: String,
    /// Additional engine-defined fields
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl SwapInfo {
    /// Status reported for ids the engine does not know.
    pub const NOT_FOUND: &'static str = "notFound";

    /// Report for an unknown swap request id.
    pub fn not_found() -> Self {
        Self {
            status: Self::NOT_FOUND.to_string(),
            details: Map::new(),
        }
    }

    /// Whether the engine reported the id as unknown.
    pub fn is_not_found(&self) -> bool {
        self.status == Self::NOT_FOUND
    }
}

// ============================================================================
// ENGINE CONTRACT
// ============================================================================

/// Per-currency collaborator that queues and pairs swap requests.
///
/// One instance exists per supported currency for the lifetime of the process;
/// instances are shared by all requests for that currency.
#[async_trait]
pub trait MatchingEngine: Send + Sync {
    /// Currency this engine was constructed for.
    fn currency(&self) -> Currency;

    /// Queues a deposit request.
    async fn add_deposit_req(&self, request: DepositRequest) -> Result<AcceptedSwapReq>;

    /// Queues a withdraw request.
    async fn add_withdraw_req(&self, request: WithdrawRequest) -> Result<AcceptedSwapReq>;

    /// Reports the current status of a swap request.
    ///
    /// Unknown ids are reported through [`SwapInfo::not_found`], not as errors.
    async fn get_swap_info(&self, swap_req_id: &SwapReqId) -> Result<SwapInfo>;

    /// Forgets a swap request. Deleting an unknown id succeeds.
    async fn delete_swap_info(&self, swap_req_id: &SwapReqId) -> Result<()>;
}

// ============================================================================
// IN-MEMORY ENGINE
// ============================================================================

#[derive(Debug, Clone)]
struct QueuedSwapReq {
    request: SwapRequest,
    created_at: i64,
}

/// Matching engine that keeps queued requests in memory.
///
/// Requests stay `pending` until deleted; no pairing is performed.
pub struct InMemoryMatchingEngine {
    currency: Currency,
    /// Map of swap_req_id -> queued request
    requests: RwLock<HashMap<SwapReqId, QueuedSwapReq>>,
}

impl InMemoryMatchingEngine {
    /// Status of every queued request.
    pub const PENDING: &'static str = "pending";

    /// Creates an empty engine for `currency`.
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            requests: RwLock::new(HashMap::new()),
        }
    }

    /// Number of queued requests.
    pub async fn queued_count(&self) -> usize {
        self.requests.read().await.len()
    }

    async fn enqueue(&self, request: SwapRequest) -> AcceptedSwapReq {
        let swap_req_id = SwapReqId(Uuid::new_v4().to_string());
        debug!(
            "Queued {} swap request {} of size {}",
            self.currency,
            swap_req_id,
            request.swap_size()
        );
        let queued = QueuedSwapReq {
            request,
            created_at: Utc::now().timestamp(),
        };
        self.requests
            .write()
            .await
            .insert(swap_req_id.clone(), queued);
        AcceptedSwapReq { swap_req_id }
    }
}

#[async_trait]
impl MatchingEngine for InMemoryMatchingEngine {
    fn currency(&self) -> Currency {
        self.currency
    }

    async fn add_deposit_req(&self, request: DepositRequest) -> Result<AcceptedSwapReq> {
        Ok(self.enqueue(SwapRequest::Deposit(request)).await)
    }

    async fn add_withdraw_req(&self, request: WithdrawRequest) -> Result<AcceptedSwapReq> {
        Ok(self.enqueue(SwapRequest::Withdraw(request)).await)
    }

    async fn get_swap_info(&self, swap_req_id: &SwapReqId) -> Result<SwapInfo> {
        let requests = self.requests.read().await;
        let Some(queued) = requests.get(swap_req_id) else {
            return Ok(SwapInfo::not_found());
        };

        let mut details = Map::new();
        details.insert("swapReqId".to_string(), json!(swap_req_id));
        details.insert("currency".to_string(), json!(self.currency));
        details.insert("createdAt".to_string(), json!(queued.created_at));
        if let Value::Object(request) = serde_json::to_value(&queued.request)? {
            details.extend(request);
        }

        Ok(SwapInfo {
            status: Self::PENDING.to_string(),
            details,
        })
    }

    async fn delete_swap_info(&self, swap_req_id: &SwapReqId) -> Result<()> {
        self.requests.write().await.remove(swap_req_id);
        Ok(())
    }
}
