//! Paymob Accept API client implementation.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::types::{
    AuthRequest, CreateOrderBody, Order, OrderRequest, PaymentKeyBody, PaymentKeyRequest,
    TokenResponse,
};

/// Seconds a payment key stays valid.
pub const PAYMENT_KEY_EXPIRATION_SECS: u64 = 3600;

/// Error type for Paymob operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymobError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Paymob answered with a non-success status.
    #[error("Paymob API error: status {status}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body, for logs.
        body: String,
    },

    /// Response body did not match the expected shape.
    #[error("Unexpected Paymob response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Paymob Accept API client.
#[derive(Debug, Clone)]
pub struct PaymobClient {
    client: Client,
    base_url: String,
}

impl PaymobClient {
    /// Production API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://accept.paymob.com/api";

    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root, e.g. [`Self::DEFAULT_BASE_URL`]
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, PaymobError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange the merchant API key for a short-lived auth token.
    pub async fn auth_token(&self, api_key: &str) -> Result<String, PaymobError> {
        let response = self
            .client
            .post(format!("{}/auth/tokens", self.base_url))
            .json(&AuthRequest { api_key })
            .send()
            .await?;

        let token: TokenResponse = self.handle_response("auth_token", response).await?;
        Ok(token.token)
    }

    /// Register an order and return it with its Paymob id.
    pub async fn create_order(
        &self,
        auth_token: &str,
        order: &OrderRequest,
    ) -> Result<Order, PaymobError> {
        let response = self
            .client
            .post(format!("{}/ecommerce/orders", self.base_url))
            .json(&CreateOrderBody {
                auth_token,
                delivery_needed: false,
                order,
            })
            .send()
            .await?;

        let created: Order = self.handle_response("create_order", response).await?;
        info!(
            order_id = created.id,
            amount_cents = order.amount_cents,
            "paymob_order_created"
        );
        Ok(created)
    }

    /// Request a payment key for an existing order.
    pub async fn create_payment_key(
        &self,
        auth_token: &str,
        request: &PaymentKeyRequest,
    ) -> Result<String, PaymobError> {
        let response = self
            .client
            .post(format!("{}/acceptance/payment_keys", self.base_url))
            .json(&PaymentKeyBody {
                auth_token,
                expiration: PAYMENT_KEY_EXPIRATION_SECS,
                request,
            })
            .send()
            .await?;

        let key: TokenResponse = self.handle_response("create_payment_key", response).await?;
        Ok(key.token)
    }

    /// Fetch an order, e.g. to double-check a transaction after a callback.
    pub async fn retrieve_order(
        &self,
        auth_token: &str,
        order_id: u64,
    ) -> Result<serde_json::Value, PaymobError> {
        let response = self
            .client
            .get(format!("{}/ecommerce/orders/{}", self.base_url, order_id))
            .bearer_auth(auth_token)
            .send()
            .await?;

        self.handle_response("retrieve_order", response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        response: Response,
    ) -> Result<T, PaymobError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(
                operation = operation,
                status_code = status.as_u16(),
                body_length = body.len(),
                "paymob_request_failed"
            );
            return Err(PaymobError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
