//! Common test utilities for relay integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::Value;

use paymob_relay::callback::PROCESSED_FIELDS;
use paymob_relay::web::router;
use paymob_relay::{
    AppState, Config, FulfillmentHook, HmacSecret, ParameterBag, SignatureVerifier,
    VerifiedTransaction,
};

/// HMAC key configured on the test server.
pub const TEST_SECRET: &str = "testsecret";

/// HMAC-SHA512 of `10000EGP123456true` under [`TEST_SECRET`].
pub const SAMPLE_HMAC: &str = "bce199eacdd38255612733bfd4199f31a4e8155f28fc74360b37d29fe06520f1d7c7b9ce0909c158e7df0a987f6b7db98e449c88605f7072c97ce4f036f8012f";

/// Fulfillment hook that records what it was given.
#[derive(Default)]
pub struct RecordingFulfillment {
    pub seen: Mutex<Vec<VerifiedTransaction>>,
    pub fail: bool,
}

impl RecordingFulfillment {
    pub fn failing() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn seen(&self) -> Vec<VerifiedTransaction> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl FulfillmentHook for RecordingFulfillment {
    async fn on_verified(&self, transaction: &VerifiedTransaction) -> Result<()> {
        self.seen.lock().unwrap().push(transaction.clone());
        if self.fail {
            bail!("order store unavailable");
        }
        Ok(())
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Hook installed on the server.
    pub fulfillment: Arc<RecordingFulfillment>,
}

impl TestHarness {
    /// Server with the HMAC secret configured and nothing else.
    pub fn new() -> Self {
        Self::with_config(Self::config())
    }

    /// Server without any secret.
    pub fn unconfigured() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_hook(config, RecordingFulfillment::default())
    }

    pub fn with_hook(config: Config, hook: RecordingFulfillment) -> Self {
        let fulfillment = Arc::new(hook);
        let state = AppState::new(config, fulfillment.clone()).expect("Failed to create state");
        let server = TestServer::new(router(state)).expect("Failed to create test server");

        Self {
            server,
            fulfillment,
        }
    }

    /// Default test configuration.
    pub fn config() -> Config {
        Config {
            hmac_secret: HmacSecret::new(TEST_SECRET),
            ..Config::default()
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Add a valid `hmac` to a processed-webhook body.
pub fn sign_webhook(mut body: Value) -> Value {
    let verifier = SignatureVerifier::new(HmacSecret::new(TEST_SECRET));
    let signature = verifier
        .sign(&ParameterBag::from_json(&body), &PROCESSED_FIELDS)
        .expect("Failed to sign");
    body["hmac"] = Value::String(signature);
    body
}

/// A realistic processed-webhook transaction object.
pub fn webhook_transaction() -> Value {
    serde_json::json!({
        "id": 192036465,
        "pending": false,
        "amount_cents": 100000,
        "success": true,
        "is_auth": false,
        "is_capture": false,
        "is_standalone_payment": true,
        "is_voided": false,
        "is_refunded": false,
        "is_3d_secure": true,
        "integration_id": 4097558,
        "has_parent_transaction": false,
        "order": {
            "id": 217503754,
            "merchant_order_id": "shop-42",
            "amount_cents": 100000
        },
        "created_at": "2024-06-13T11:33:44.592345",
        "currency": "EGP",
        "source_data": {
            "pan": "2346",
            "type": "card",
            "sub_type": "MasterCard"
        },
        "error_occured": false,
        "owner": 1664127,
        "data": { "message": "Approved" }
    })
}
