//! Route handlers
//!
//! Each handler runs after its route has matched. Failures are returned as
//! [`ApiError`] rejections and translated by the rejection handler.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use warp::hyper::body::Bytes;
use warp::{Rejection, Reply};

use super::error::ApiError;
use crate::currency::{Currency, CurrencyRegistry, ResolvedCurrency};
use crate::matching_engine::{AcceptedSwapReq, SwapReqId};
use crate::price_watcher::PriceWatcher;
use crate::storage::RefundStore;
use crate::structs::{parse_struct, DepositRequest, StoreRefundTxRequest, WithdrawRequest};
use crate::swap_size::{SwapSize, SwapSizePolicy};

// ============================================================================
// RESPONSE STRUCTURES
// ============================================================================

/// Response body of `GET /supportedCurrencies`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedCurrenciesResponse {
    /// Every currency with a matching engine
    pub supported_currencies: Vec<Currency>,
}

/// Response body of `GET /refundTx/:hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundTxResponse {
    /// Stored transaction blob
    pub xdr: String,
}

// ============================================================================
// GENERAL HANDLERS
// ============================================================================

/// Handler for `GET /supportedCurrencies`.
pub fn supported_currencies(registry: Arc<CurrencyRegistry>) -> impl Reply {
    warp::reply::json(&SupportedCurrenciesResponse {
        supported_currencies: registry.currencies(),
    })
}

/// Handler for `POST /refundTx`.
///
/// # Arguments
///
/// * `body` - Raw request body, expected to be a `StoreRefundTxRequest`
/// * `store` - Refund transaction store
///
/// # Returns
///
/// * `Ok(warp::Reply)` - JSON `{hash}` of the stored transaction
/// * `Err(warp::Rejection)` - Invalid body (400) or store failure (500)
pub async fn store_refund_tx(
    body: Bytes,
    store: Arc<dyn RefundStore>,
) -> Result<impl Reply, Rejection> {
    debug!("POST /refundTx - Received body: {}", String::from_utf8_lossy(&body));
    let request: StoreRefundTxRequest = parse_struct(&body).map_err(ApiError::from)?;

    let stored = store.save(&request.xdr).await.map_err(ApiError::Collaborator)?;
    info!("Stored refund transaction {}", stored.hash);
    Ok(warp::reply::json(&stored))
}

/// Handler for `GET /refundTx/:hash`.
///
/// # Returns
///
/// * `Ok(warp::Reply)` - JSON `{xdr}` stored under `hash`
/// * `Err(warp::Rejection)` - Unknown hash (404) or store failure (500)
pub async fn retrieve_refund_tx(
    hash: String,
    store: Arc<dyn RefundStore>,
) -> Result<impl Reply, Rejection> {
    let xdr = store
        .retrieve(&hash)
        .await
        .map_err(ApiError::Collaborator)?
        .ok_or(ApiError::RefundTxNotFound)?;
    Ok(warp::reply::json(&RefundTxResponse { xdr }))
}

/// Payloads the price watcher uses to mean "no data".
fn is_falsy(prices: &Value) -> bool {
    match prices {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Handler for `GET /prices/:currencyPair`.
///
/// A missing or falsy payload (`null`, `false`, `0`, `""`) is reported as
/// 404 with an empty body.
pub async fn get_prices(
    currency_pair: String,
    watcher: Arc<dyn PriceWatcher>,
) -> Result<impl Reply, Rejection> {
    match watcher
        .retrieve_prices(&currency_pair)
        .await
        .map_err(ApiError::Collaborator)?
    {
        Some(prices) if !is_falsy(&prices) => Ok(warp::reply::json(&prices)),
        _ => Err(ApiError::PricesUnavailable.into()),
    }
}

// ============================================================================
// SWAP HANDLERS
// ============================================================================

/// Resolves the `:currency` path segment of every `/swap` route.
///
/// Runs before the body is parsed, so unknown currencies are reported as 404
/// even when the body is also invalid.
pub async fn resolve_currency(
    currency_id: String,
    registry: Arc<CurrencyRegistry>,
) -> Result<ResolvedCurrency, Rejection> {
    registry
        .resolve(&currency_id)
        .map_err(|e| ApiError::from(e).into())
}

fn ensure_swap_size_supported(policy: &SwapSizePolicy, size: &SwapSize) -> Result<(), ApiError> {
    if policy.is_supported(size) {
        Ok(())
    } else {
        Err(ApiError::UnsupportedSwapSize(size.clone()))
    }
}

fn log_accepted<T: Serialize>(currency: Currency, accepted: &AcceptedSwapReq, request: &T) {
    let payload = serde_json::to_string(request).unwrap_or_default();
    info!(
        "Added {} swap request {}: {}",
        currency, accepted.swap_req_id, payload
    );
}

/// Handler for `POST /swap/:currency/deposit`.
///
/// # Arguments
///
/// * `resolved` - Currency and matching engine from the path
/// * `body` - Raw request body, expected to be a `DepositRequest`
/// * `policy` - Swap size policy
///
/// # Returns
///
/// * `Ok(warp::Reply)` - JSON `{swapReqId}` assigned by the engine
/// * `Err(warp::Rejection)` - Invalid body or size (400), engine failure (500)
pub async fn add_deposit_req(
    resolved: ResolvedCurrency,
    body: Bytes,
    policy: Arc<SwapSizePolicy>,
) -> Result<impl Reply, Rejection> {
    debug!(
        "POST /swap/{}/deposit - Received body: {}",
        resolved.currency,
        String::from_utf8_lossy(&body)
    );
    let request: DepositRequest = parse_struct(&body).map_err(ApiError::from)?;
    ensure_swap_size_supported(&policy, &request.swap_size)?;

    let accepted = resolved
        .engine
        .add_deposit_req(request.clone())
        .await
        .map_err(ApiError::Collaborator)?;
    log_accepted(resolved.currency, &accepted, &request);
    Ok(warp::reply::json(&accepted))
}

/// Handler for `POST /swap/:currency/withdraw`.
///
/// Same sequence as [`add_deposit_req`] with a `WithdrawRequest` body.
pub async fn add_withdraw_req(
    resolved: ResolvedCurrency,
    body: Bytes,
    policy: Arc<SwapSizePolicy>,
) -> Result<impl Reply, Rejection> {
    debug!(
        "POST /swap/{}/withdraw - Received body: {}",
        resolved.currency,
        String::from_utf8_lossy(&body)
    );
    let request: WithdrawRequest = parse_struct(&body).map_err(ApiError::from)?;
    ensure_swap_size_supported(&policy, &request.swap_size)?;

    let accepted = resolved
        .engine
        .add_withdraw_req(request.clone())
        .await
        .map_err(ApiError::Collaborator)?;
    log_accepted(resolved.currency, &accepted, &request);
    Ok(warp::reply::json(&accepted))
}

/// Handler for `GET /swap/:currency/match/:swapReqId`.
///
/// The engine's payload is returned verbatim unless its status is `notFound`.
pub async fn get_swap_info(
    resolved: ResolvedCurrency,
    swap_req_id: String,
) -> Result<impl Reply, Rejection> {
    let info = resolved
        .engine
        .get_swap_info(&SwapReqId::from(swap_req_id))
        .await
        .map_err(ApiError::Collaborator)?;

    if info.is_not_found() {
        return Err(ApiError::SwapNotFound.into());
    }
    Ok(warp::reply::json(&info))
}

/// Handler for `DELETE /swap/:currency/match/:swapReqId`.
pub async fn delete_swap_info(
    resolved: ResolvedCurrency,
    swap_req_id: String,
) -> Result<impl Reply, Rejection> {
    let swap_req_id = SwapReqId::from(swap_req_id);
    resolved
        .engine
        .delete_swap_info(&swap_req_id)
        .await
        .map_err(ApiError::Collaborator)?;
    info!("Deleted {} swap request {}", resolved.currency, swap_req_id);
    Ok("OK")
}
