//! Unit tests for refund transaction storage

use sha2::{Digest, Sha256};
use swap_gateway::storage::refund_tx_hash;
use swap_gateway::{InMemoryRefundStore, RefundStore};

#[path = "mod.rs"]
mod test_helpers;
use test_helpers::DUMMY_XDR;

/// What is tested: The storage key is the hex SHA-256 of the blob
/// Why: Clients may compute the hash themselves before storing
#[test]
fn test_refund_tx_hash_is_sha256_hex() {
    let expected = hex::encode(Sha256::digest(DUMMY_XDR.as_bytes()));

    let hash = refund_tx_hash(DUMMY_XDR);

    assert_eq!(hash, expected);
    assert_eq!(hash.len(), 64);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(
        refund_tx_hash(""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

/// What is tested: Save then retrieve by returned hash
/// Why: The hash is the only handle clients keep
#[tokio::test]
async fn test_save_and_retrieve() {
    let store = InMemoryRefundStore::new();
    assert!(store.is_empty().await);

    let stored = store.save(DUMMY_XDR).await.unwrap();

    assert_eq!(stored.hash, refund_tx_hash(DUMMY_XDR));
    assert_eq!(
        store.retrieve(&stored.hash).await.unwrap(),
        Some(DUMMY_XDR.to_string())
    );
    assert_eq!(store.len().await, 1);
}

/// What is tested: Saving the same blob twice
/// Why: Entries are insert-once and content addressed
#[tokio::test]
async fn test_save_is_idempotent() {
    let store = InMemoryRefundStore::new();

    let first = store.save(DUMMY_XDR).await.unwrap();
    let second = store.save(DUMMY_XDR).await.unwrap();
    let other = store.save("AAAA").await.unwrap();

    assert_eq!(first, second);
    assert_ne!(first.hash, other.hash);
    assert_eq!(store.len().await, 2);
}

/// What is tested: Unknown hashes
/// Why: A miss is `None`, which the API reports as 404
#[tokio::test]
async fn test_retrieve_unknown_hash() {
    let store = InMemoryRefundStore::default();
    store.save(DUMMY_XDR).await.unwrap();

    assert_eq!(store.retrieve(&"0".repeat(64)).await.unwrap(), None);
    assert_eq!(
        store.retrieve(&refund_tx_hash(DUMMY_XDR).to_uppercase()).await.unwrap(),
        None
    );
}
