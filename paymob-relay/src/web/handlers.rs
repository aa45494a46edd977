//! HTTP endpoint handlers.
//!
//! Handlers only translate between HTTP and the relay's modules:
//! 1. Extract the raw input (query string, body)
//! 2. Call checkout or callback verification
//! 3. Map the outcome to a status code and JSON body

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, RawQuery, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::callback::{
    CallbackDispatcher, FulfillmentHook, SignatureVerifier, Verdict, VerifiedTransaction,
};
use crate::paymob::{start_card_checkout, CardCheckout, CardCheckoutInput, Customer, PaymobClient, PaymobError};
use crate::web::error::ApiError;
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: CallbackDispatcher,
    pub paymob: PaymobClient,
    pub fulfillment: Arc<dyn FulfillmentHook>,
}

impl AppState {
    pub fn new(config: Config, fulfillment: Arc<dyn FulfillmentHook>) -> Result<Self, PaymobError> {
        let paymob = PaymobClient::new(
            config.paymob_base_url.clone(),
            Duration::from_millis(config.request_timeout_ms),
        )?;
        let dispatcher = CallbackDispatcher::new(SignatureVerifier::new(config.hmac_secret.clone()));

        Ok(Self {
            config: Arc::new(config),
            dispatcher,
            paymob,
            fulfillment,
        })
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Card Checkout
// =============================================================================

/// Message returned for any checkout request the relay cannot use.
const CHECKOUT_REQUIRED_MESSAGE: &str = "amountEGP and customer are required";

/// Checkout request from the merchant app.
#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    #[serde(default, rename = "amountEGP")]
    pub amount_egp: Option<AmountEgp>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub merchant_order_id: Option<String>,
}

/// Amount in pounds, sent either as a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AmountEgp {
    Number(f64),
    Text(String),
}

impl AmountEgp {
    /// The amount, when it is a finite number greater than zero.
    pub fn positive(&self) -> Option<f64> {
        let amount = match self {
            AmountEgp::Number(n) => *n,
            AmountEgp::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        (amount.is_finite() && amount > 0.0).then_some(amount)
    }
}

/// Checkout response.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub checkout: CardCheckout,
}

/// Card checkout endpoint.
///
/// Creates a Paymob order and payment key and returns the hosted iframe URL.
/// Bodies that are not JSON or do not match [`CheckoutBody`] get the same
/// JSON 400 as a request missing its amount or customer.
pub async fn card_checkout(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutBody>, JsonRejection>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!(
                status = rejection.status().as_u16(),
                reason = %rejection.body_text(),
                "checkout_body_rejected"
            );
            return Err(ApiError::BadRequest(CHECKOUT_REQUIRED_MESSAGE.to_string()));
        }
    };

    let amount_egp = body.amount_egp.as_ref().and_then(AmountEgp::positive);
    let (amount_egp, customer) = match (amount_egp, body.customer) {
        (Some(amount), Some(customer)) => (amount, customer),
        _ => {
            warn!("checkout_invalid_request");
            return Err(ApiError::BadRequest(CHECKOUT_REQUIRED_MESSAGE.to_string()));
        }
    };

    let settings = state.config.checkout()?;

    let input = CardCheckoutInput {
        amount_egp,
        customer,
        merchant_order_id: body.merchant_order_id,
    };

    let checkout = start_card_checkout(&state.paymob, &settings, &input).await?;

    info!(order_id = checkout.order_id, "checkout_created");

    Ok(Json(CheckoutResponse { ok: true, checkout }))
}

// =============================================================================
// Redirection Callback
// =============================================================================

/// Verdict for a verified redirection.
#[derive(Debug, Serialize)]
pub struct RedirectionResponse {
    pub ok: bool,
    pub verified: bool,
    #[serde(flatten)]
    pub transaction: VerifiedTransaction,
}

/// Browser redirection verification endpoint.
///
/// The merchant's return page forwards Paymob's query string here and gets a
/// JSON verdict back.
pub async fn redirection_verify(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<RedirectionResponse>, ApiError> {
    info!(
        query_length = query.as_ref().map(|q| q.len()).unwrap_or(0),
        "redirection_callback_received"
    );

    match state.dispatcher.redirection(query.as_deref())? {
        Verdict::Verified(transaction) => Ok(Json(RedirectionResponse {
            ok: true,
            verified: true,
            transaction,
        })),
        Verdict::Rejected(_) => Err(ApiError::InvalidSignature),
    }
}

// =============================================================================
// Processed Webhook
// =============================================================================

/// Webhook response.
#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Paymob transaction-processed webhook endpoint.
///
/// This endpoint:
/// 1. Reads the raw body and parses it leniently
/// 2. Verifies the HMAC signature
/// 3. Hands verified transactions to the fulfillment hook
pub async fn paymob_webhook(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    info!(body_length = body.len(), "processed_webhook_received");

    let verdict = match state.dispatcher.processed(&body) {
        Ok(verdict) => verdict,
        Err(e) => {
            error!(error = %e, "processed_webhook_not_configured");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WebhookResponse {
                    status: "error",
                    message: Some(e.to_string()),
                }),
            );
        }
    };

    let transaction = match verdict {
        Verdict::Verified(transaction) => transaction,
        Verdict::Rejected(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(WebhookResponse {
                    status: "invalid_hmac",
                    message: None,
                }),
            );
        }
    };

    if let Err(e) = state.fulfillment.on_verified(&transaction).await {
        error!(
            error = %e,
            order_id = ?transaction.order_id,
            tx_id = ?transaction.tx_id,
            "fulfillment_failed"
        );
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(WebhookResponse {
                status: "error",
                message: None,
            }),
        );
    }

    (
        StatusCode::OK,
        Json(WebhookResponse {
            status: "ok",
            message: None,
        }),
    )
}
