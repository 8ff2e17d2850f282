//! Response translation for failed requests
//!
//! Every handler failure is raised as a warp rejection carrying an
//! [`ApiError`]; [`handle_rejection`] is the single place where rejections
//! become HTTP status/body pairs. Error bodies are plain text.

use std::convert::Infallible;
use thiserror::Error;
use tracing::error;
use warp::{http::StatusCode, Rejection, Reply};

use crate::currency::UnsupportedCurrency;
use crate::structs::ValidationError;
use crate::swap_size::SwapSize;

// ============================================================================
// ERROR TAXONOMY
// ============================================================================

/// Failure outcomes of a gateway request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body failed struct validation
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Path segment is not valid percent-encoded UTF-8
    #[error("Failed to decode path segment: {0}")]
    MalformedPathSegment(String),
    /// Swap size is not accepted by the swap size policy
    #[error("Unsupported swap size: {0}")]
    UnsupportedSwapSize(SwapSize),
    /// Path names a currency without a matching engine
    #[error(transparent)]
    UnsupportedCurrency(#[from] UnsupportedCurrency),
    /// Matching engine reported the swap request id as unknown
    #[error("Swap not found")]
    SwapNotFound,
    /// Nothing is stored under the requested refund transaction hash
    #[error("Refund transaction not found")]
    RefundTxNotFound,
    /// Price watcher has no data for the requested pair
    #[error("Prices unavailable")]
    PricesUnavailable,
    /// A collaborator call failed
    #[error("Collaborator call failed: {0}")]
    Collaborator(anyhow::Error),
}

impl warp::reject::Reject for ApiError {}

impl ApiError {
    /// HTTP status the error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::MalformedPathSegment(_)
            | ApiError::UnsupportedSwapSize(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedCurrency(_)
            | ApiError::SwapNotFound
            | ApiError::RefundTxNotFound
            | ApiError::PricesUnavailable => StatusCode::NOT_FOUND,
            ApiError::Collaborator(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Response body sent to the client.
    ///
    /// Collaborator failure details stay in the logs.
    pub fn body(&self) -> String {
        match self {
            ApiError::PricesUnavailable => String::new(),
            ApiError::Collaborator(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Body of every 500 response.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

// ============================================================================
// REJECTION HANDLER
// ============================================================================

/// Global rejection handler for all API routes.
///
/// # Arguments
///
/// * `rej` - The warp rejection to handle
///
/// # Returns
///
/// A plain-text reply with the status matching the rejection
pub async fn handle_rejection(rej: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if let Some(err) = rej.find::<ApiError>() {
        if let ApiError::Collaborator(cause) = err {
            error!("Collaborator call failed: {:#}", cause);
        }
        (err.status(), err.body())
    } else if rej.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large".to_string())
    } else if rej.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Content-Length required".to_string())
    } else if rej.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if rej.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        error!("Unhandled rejection: {:?}", rej);
        (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE.to_string())
    };

    Ok(warp::reply::with_status(message, status))
}
