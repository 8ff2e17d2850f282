//! Request Struct Validation Module
//!
//! Untrusted request bodies are parsed here into typed request values. Parsing
//! happens in three stages: raw bytes to JSON, JSON to the target shape, and
//! per-field domain checks. Each stage reports a [`ValidationError`] whose
//! message is returned verbatim to the client.

use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::swap_size::SwapSize;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Largest accepted address string, in characters.
pub const MAX_ADDRESS_LEN: usize = 256;

/// Largest accepted decoded refund transaction, in bytes.
pub const MAX_XDR_BYTES: usize = 64 * 1024;

// ============================================================================
// ERRORS
// ============================================================================

/// Reason a request body was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Body is not JSON at all
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    /// Body is JSON but does not have the expected shape
    #[error("Invalid request: {0}")]
    InvalidShape(String),
    /// A field has the right type but an out-of-domain value
    #[error("Invalid field `{field}`: {reason}")]
    InvalidField {
        /// Wire name of the offending field
        field: &'static str,
        /// Human-readable explanation
        reason: String,
    },
}

// ============================================================================
// VALIDATION
// ============================================================================

/// A request shape that can be parsed from an untrusted JSON body.
pub trait RequestStruct: DeserializeOwned {
    /// Checks field values once the shape itself has been accepted.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Parses a raw body into a fully validated request struct.
///
/// # Arguments
///
/// * `body` - Raw request body bytes
///
/// # Returns
///
/// * `Ok(T)` - Body matched the shape and passed all field checks
/// * `Err(ValidationError)` - First problem found
pub fn parse_struct<T: RequestStruct>(body: &[u8]) -> Result<T, ValidationError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| ValidationError::InvalidJson(e.to_string()))?;
    let parsed: T =
        serde_json::from_value(value).map_err(|e| ValidationError::InvalidShape(e.to_string()))?;
    parsed.validate()?;
    Ok(parsed)
}

fn validate_address(field: &'static str, address: &str) -> Result<(), ValidationError> {
    if address.is_empty() {
        return Err(ValidationError::InvalidField {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    if address.chars().count() > MAX_ADDRESS_LEN {
        return Err(ValidationError::InvalidField {
            field,
            reason: format!("must be at most {} characters", MAX_ADDRESS_LEN),
        });
    }
    if address.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidField {
            field,
            reason: "must not contain whitespace".to_string(),
        });
    }
    Ok(())
}

/// Checks that `hash` looks like a refund transaction content hash.
pub fn validate_refund_tx_hash(field: &'static str, hash: &str) -> Result<(), ValidationError> {
    let well_formed =
        hash.len() == 64 && hash.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if !well_formed {
        return Err(ValidationError::InvalidField {
            field,
            reason: "must be 64 lower-case hex characters".to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// REQUEST SHAPES
// ============================================================================

/// Body of `POST /swap/:currency/deposit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DepositRequest {
    /// Denomination being deposited
    pub swap_size: SwapSize,
    /// Address funds are returned to if the swap does not complete
    pub refund_address: String,
    /// Hash of a refund transaction previously stored via `/refundTx`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_tx_hash: Option<String>,
}

impl RequestStruct for DepositRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_address("refundAddress", &self.refund_address)?;
        if let Some(hash) = &self.refund_tx_hash {
            validate_refund_tx_hash("refundTxHash", hash)?;
        }
        Ok(())
    }
}

/// Body of `POST /swap/:currency/withdraw`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WithdrawRequest {
    /// Denomination being withdrawn
    pub swap_size: SwapSize,
    /// Address the withdrawn funds are sent to
    pub destination_address: String,
}

impl RequestStruct for WithdrawRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_address("destinationAddress", &self.destination_address)
    }
}

/// Body of `POST /refundTx`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreRefundTxRequest {
    /// Base64-encoded XDR transaction envelope
    pub xdr: String,
}

impl RequestStruct for StoreRefundTxRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.xdr.is_empty() {
            return Err(ValidationError::InvalidField {
                field: "xdr",
                reason: "must not be empty".to_string(),
            });
        }
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&self.xdr)
            .map_err(|e| ValidationError::InvalidField {
                field: "xdr",
                reason: format!("must be base64: {}", e),
            })?;
        if decoded.len() > MAX_XDR_BYTES {
            return Err(ValidationError::InvalidField {
                field: "xdr",
                reason: format!("must decode to at most {} bytes", MAX_XDR_BYTES),
            });
        }
        Ok(())
    }
}

/// A validated swap request of either direction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SwapRequest {
    /// Funds entering the swap pool
    Deposit(DepositRequest),
    /// Funds leaving the swap pool
    Withdraw(WithdrawRequest),
}

impl SwapRequest {
    /// Size class shared by both directions.
    pub fn swap_size(&self) -> &SwapSize {
        match self {
            SwapRequest::Deposit(request) => &request.swap_size,
            SwapRequest::Withdraw(request) => &request.swap_size,
        }
    }
}
