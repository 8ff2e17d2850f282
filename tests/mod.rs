//! Test module organization
//!
//! This module re-exports test helpers for use in test files.

mod helpers;

#[allow(unused_imports)]
pub use helpers::{
    build_test_config, deposit_body, withdraw_body, EngineCall, RecordingMatchingEngine,
    RecordingRefundStore, StaticPriceWatcher, TestGateway, DUMMY_DESTINATION_ADDRESS,
    DUMMY_REFUND_ADDRESS, DUMMY_SWAP_REQ_ID, DUMMY_XDR, SUPPORTED_SWAP_SIZE,
    UNSUPPORTED_SWAP_SIZE,
};
