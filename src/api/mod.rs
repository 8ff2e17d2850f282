//! REST API Server Module
//!
//! This module provides the HTTP surface of the swap gateway: route binding,
//! request handlers and translation of failures into HTTP responses.

// Error taxonomy and rejection handler
mod error;

// Route handlers
mod handlers;

// Server, route table, CORS and request logging
mod server;

pub use error::{handle_rejection, ApiError, INTERNAL_ERROR_MESSAGE};
pub use handlers::{RefundTxResponse, SupportedCurrenciesResponse};
pub use server::{
    cors_headers, ApiServer, CORS_ALLOW_HEADERS, CORS_ALLOW_METHODS, CORS_ALLOW_ORIGIN,
};
