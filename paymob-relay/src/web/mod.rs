//! Web server module.
//!
//! This module provides a thin web server that:
//! - Starts card checkouts for the merchant app
//! - Verifies Paymob browser redirections and returns a JSON verdict
//! - Verifies Paymob processed webhooks and triggers fulfillment
//!
//! All signature logic lives in [`crate::callback`].

pub mod error;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use handlers::{
    card_checkout, health, paymob_webhook, redirection_verify, AmountEgp, AppState, CheckoutBody,
    CheckoutResponse, HealthResponse, RedirectionResponse, WebhookResponse,
};

/// Build the router with every relay endpoint.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/paymob/checkout/card", post(card_checkout))
        .route("/api/paymob/redirection-verify", get(redirection_verify))
        .route("/webhooks/paymob", post(paymob_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
