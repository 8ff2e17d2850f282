//! Storage Module
//!
//! This module provides storage abstractions for the swap gateway,
//! including the content-addressed refund transaction store.

pub mod refund_txs;

// Re-export for convenience
pub use refund_txs::{refund_tx_hash, InMemoryRefundStore, RefundStore, StoredRefundTx};
