//! API server and route table
//!
//! Binds every gateway route, attaches request logging and CORS headers, and
//! owns the shared collaborators handed to the handlers.

use anyhow::{Context, Result};
use chrono::Utc;
use percent_encoding::percent_decode_str;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::info;
use warp::filters::path::FullPath;
use warp::http::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use warp::http::Method;
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection};

use super::error::{handle_rejection, ApiError};
use super::handlers;
use crate::config::Config;
use crate::currency::{CurrencyRegistry, ResolvedCurrency};
use crate::price_watcher::PriceWatcher;
use crate::storage::RefundStore;
use crate::swap_size::{SwapSize, SwapSizePolicy};

// ============================================================================
// CORS CONFIGURATION
// ============================================================================

/// `Access-Control-Allow-Origin` value sent on every response.
pub const CORS_ALLOW_ORIGIN: &str = "*";

/// `Access-Control-Allow-Headers` value sent on every response.
pub const CORS_ALLOW_HEADERS: &str =
    "Content-Type, Access-Control-Allow-Headers, Authorization, X-Requested-With";

/// `Access-Control-Allow-Methods` value sent on every response.
pub const CORS_ALLOW_METHODS: &str = "GET, POST, DELETE, OPTIONS";

/// Fixed CORS headers attached to every response, including errors.
pub fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(CORS_ALLOW_ORIGIN),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers
}

// ============================================================================
// WARP FILTER HELPERS
// ============================================================================

/// Creates a filter that hands a clone of `state` to the handler.
fn with_state<T>(state: T) -> impl Filter<Extract = (T,), Error = Infallible> + Clone
where
    T: Clone + Send + Sync + 'static,
{
    warp::any().map(move || state.clone())
}

/// Logs every inbound request before routing.
fn log_request() -> impl Filter<Extract = (), Error = Infallible> + Clone {
    warp::method()
        .and(warp::path::full())
        .map(|method: Method, path: FullPath| {
            info!("{} {} {}", Utc::now().to_rfc3339(), method, path.as_str());
        })
        .untuple_one()
}

/// One path segment, percent-decoded.
///
/// Segments that do not decode to UTF-8 are rejected with 400.
fn path_segment() -> impl Filter<Extract = (String,), Error = Rejection> + Clone {
    warp::path::param::<String>().and_then(|raw: String| async move {
        match percent_decode_str(&raw).decode_utf8() {
            Ok(decoded) => Ok(decoded.into_owned()),
            Err(_) => Err(warp::reject::custom(ApiError::MalformedPathSegment(raw))),
        }
    })
}

/// Raw JSON body, bounded by the configured size limit.
fn json_body(max_body_bytes: u64) -> impl Filter<Extract = (Bytes,), Error = Rejection> + Clone {
    warp::body::content_length_limit(max_body_bytes).and(warp::body::bytes())
}

/// Answers CORS preflight requests on any path.
///
/// Non-OPTIONS requests are passed on as "not found" so they never mask the
/// real route's outcome.
fn preflight() -> impl Filter<Extract = (&'static str,), Error = Rejection> + Clone {
    warp::method().and_then(|method: Method| async move {
        if method == Method::OPTIONS {
            Ok("OK")
        } else {
            Err(warp::reject::not_found())
        }
    })
}

// ============================================================================
// API SERVER IMPLEMENTATION
// ============================================================================

/// REST API server for the swap gateway.
///
/// Holds the currency registry, swap size policy and collaborators. None of
/// them is mutated by the server; all mutation happens inside collaborators.
pub struct ApiServer {
    /// Service configuration
    config: Arc<Config>,
    /// Matching engine per supported currency
    registry: Arc<CurrencyRegistry>,
    /// Accepted swap sizes
    swap_policy: Arc<SwapSizePolicy>,
    /// Refund transaction store
    refund_store: Arc<dyn RefundStore>,
    /// Price watcher for `/prices`
    price_watcher: Arc<dyn PriceWatcher>,
}

impl ApiServer {
    /// Creates a new API server with the given components.
    ///
    /// # Arguments
    ///
    /// * `config` - Service configuration
    /// * `registry` - Currency registry built at startup
    /// * `refund_store` - Refund transaction store
    /// * `price_watcher` - Price watcher (started by [`ApiServer::run`])
    ///
    /// # Returns
    ///
    /// * `Ok(ApiServer)` - Server ready to run
    /// * `Err(anyhow::Error)` - Configured swap sizes are invalid
    pub fn new(
        config: Config,
        registry: CurrencyRegistry,
        refund_store: Arc<dyn RefundStore>,
        price_watcher: Arc<dyn PriceWatcher>,
    ) -> Result<Self> {
        let swap_policy = SwapSizePolicy::from_config(&config.swap.supported_sizes)
            .context("Invalid swap size configuration")?;
        let sizes: Vec<&str> = swap_policy.supported_sizes().map(SwapSize::as_str).collect();
        info!("Accepting swap sizes: {}", sizes.join(", "));

        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            swap_policy: Arc::new(swap_policy),
            refund_store,
            price_watcher,
        })
    }

    /// Binds the listener, starts price watching and serves requests.
    ///
    /// Price watching starts only after the listener is bound.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Server stopped
    /// * `Err(anyhow::Error)` - Address invalid, bind failed or watcher failed to start
    pub async fn run(&self) -> Result<()> {
        let addr: std::net::SocketAddr =
            format!("{}:{}", self.config.api.host, self.config.api.port)
                .parse()
                .context("Failed to parse API server address")?;

        let routes = self.create_routes();
        let (bound_addr, server) = warp::serve(routes)
            .try_bind_ephemeral(addr)
            .context("Failed to bind API server")?;
        info!("Listening on {}", bound_addr);

        self.price_watcher
            .start_watching()
            .await
            .context("Failed to start price watcher")?;

        server.await;
        Ok(())
    }

    /// Creates all API routes for the server.
    ///
    /// # Returns
    ///
    /// A warp filter containing all API routes
    pub(crate) fn create_routes(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
        let max_body_bytes = self.config.api.max_body_bytes;

        // GET / - liveness probe
        let root = warp::path::end().and(warp::get()).map(|| "OK");

        // GET /supportedCurrencies
        let supported_currencies = warp::path("supportedCurrencies")
            .and(warp::path::end())
            .and(warp::get())
            .and(with_state(self.registry.clone()))
            .map(handlers::supported_currencies);

        // POST /refundTx
        let store_refund_tx = warp::path("refundTx")
            .and(warp::path::end())
            .and(warp::post())
            .and(json_body(max_body_bytes))
            .and(with_state(self.refund_store.clone()))
            .and_then(handlers::store_refund_tx);

        // GET /refundTx/:hash
        let retrieve_refund_tx = warp::path("refundTx")
            .and(path_segment())
            .and(warp::path::end())
            .and(warp::get())
            .and(with_state(self.refund_store.clone()))
            .and_then(handlers::retrieve_refund_tx);

        // GET /prices/:currencyPair
        let prices = warp::path("prices")
            .and(path_segment())
            .and(warp::path::end())
            .and(warp::get())
            .and(with_state(self.price_watcher.clone()))
            .and_then(handlers::get_prices);

        // /swap/:currency/... - currency resolved before anything else
        let swap_currency = warp::path("swap")
            .and(path_segment())
            .and(with_state(self.registry.clone()))
            .and_then(handlers::resolve_currency);

        // GET /swap/:currency
        let swap_root = swap_currency
            .clone()
            .and(warp::path::end())
            .and(warp::get())
            .map(|_resolved: ResolvedCurrency| "OK");

        // POST /swap/:currency/deposit
        let deposit = swap_currency
            .clone()
            .and(warp::path("deposit"))
            .and(warp::path::end())
            .and(warp::post())
            .and(json_body(max_body_bytes))
            .and(with_state(self.swap_policy.clone()))
            .and_then(handlers::add_deposit_req);

        // POST /swap/:currency/withdraw
        let withdraw = swap_currency
            .clone()
            .and(warp::path("withdraw"))
            .and(warp::path::end())
            .and(warp::post())
            .and(json_body(max_body_bytes))
            .and(with_state(self.swap_policy.clone()))
            .and_then(handlers::add_withdraw_req);

        // GET /swap/:currency/match/:swapReqId
        let get_swap = swap_currency
            .clone()
            .and(warp::path("match"))
            .and(path_segment())
            .and(warp::path::end())
            .and(warp::get())
            .and_then(handlers::get_swap_info);

        // DELETE /swap/:currency/match/:swapReqId
        let delete_swap = swap_currency
            .and(warp::path("match"))
            .and(path_segment())
            .and(warp::path::end())
            .and(warp::delete())
            .and_then(handlers::delete_swap_info);

        let routes = preflight()
            .or(root)
            .or(supported_currencies)
            .or(store_refund_tx)
            .or(retrieve_refund_tx)
            .or(prices)
            .or(swap_root)
            .or(deposit)
            .or(withdraw)
            .or(get_swap)
            .or(delete_swap);

        // Log, route, translate failures, then stamp CORS headers on whatever came out
        log_request()
            .and(routes)
            .recover(handle_rejection)
            .with(warp::reply::with::headers(cors_headers()))
    }

    /// Public method for testing - exposes routes for integration tests
    pub fn test_routes(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
        self.create_routes()
    }
}
