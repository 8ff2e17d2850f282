//! Refund Transaction Storage Module
//!
//! Refund transactions are opaque XDR blobs stored under the hex-encoded
//! SHA-256 of their contents. A stored blob never changes: saving the same
//! blob twice yields the same hash and leaves the original entry untouched.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Result of storing a refund transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRefundTx {
    /// Content hash the transaction can be retrieved by
    pub hash: String,
}

/// Content hash used as the refund transaction key.
pub fn refund_tx_hash(xdr: &str) -> String {
    hex::encode(Sha256::digest(xdr.as_bytes()))
}

// ============================================================================
// STORE CONTRACT
// ============================================================================

/// Collaborator that persists refund transactions.
#[async_trait]
pub trait RefundStore: Send + Sync {
    /// Stores `xdr` and returns its content hash.
    async fn save(&self, xdr: &str) -> Result<StoredRefundTx>;

    /// Looks up a stored transaction.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(xdr))` - Transaction stored under `hash`
    /// * `Ok(None)` - Nothing stored under `hash`
    /// * `Err(anyhow::Error)` - Store unavailable
    async fn retrieve(&self, hash: &str) -> Result<Option<String>>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// In-memory refund transaction store.
///
/// Uses HashMap for O(1) lookup by hash. Thread-safe via RwLock.
pub struct InMemoryRefundStore {
    /// Map of hash -> xdr
    txs: RwLock<HashMap<String, String>>,
}

impl InMemoryRefundStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            txs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored transactions.
    pub async fn len(&self) -> usize {
        self.txs.read().await.len()
    }

    /// Whether nothing has been stored yet.
    pub async fn is_empty(&self) -> bool {
        self.txs.read().await.is_empty()
    }
}

impl Default for InMemoryRefundStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RefundStore for InMemoryRefundStore {
    async fn save(&self, xdr: &str) -> Result<StoredRefundTx> {
        let hash = refund_tx_hash(xdr);
        self.txs
            .write()
            .await
            .entry(hash.clone())
            .or_insert_with(|| xdr.to_string());
        Ok(StoredRefundTx { hash })
    }

    async fn retrieve(&self, hash: &str) -> Result<Option<String>> {
        Ok(self.txs.read().await.get(hash).cloned())
    }
}
