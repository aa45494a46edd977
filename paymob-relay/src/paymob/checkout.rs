//! Card checkout: auth token → order → payment key → iframe URL.

use serde::Serialize;
use tracing::info;
use url::Url;

use super::client::{PaymobClient, PaymobError};
use super::types::{BillingData, Customer, OrderRequest, PaymentKeyRequest};
use crate::config::CheckoutSettings;

/// Currency for every checkout the relay creates.
pub const CHECKOUT_CURRENCY: &str = "EGP";

/// Hosted iframe page that renders the card form for a payment key.
pub const IFRAME_BASE_URL: &str = "https://accept.paymob.com/api/acceptance/iframes";

/// A checkout request from the merchant app.
#[derive(Debug, Clone)]
pub struct CardCheckoutInput {
    /// Amount in major units (pounds)
    pub amount_egp: f64,
    pub customer: Customer,
    pub merchant_order_id: Option<String>,
}

/// What the merchant app needs to show the payment form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardCheckout {
    pub order_id: u64,
    pub payment_key: String,
    pub iframe_url: String,
}

/// Convert pounds to piasters, rounding to the nearest piaster.
pub fn amount_to_cents(amount_egp: f64) -> u64 {
    (amount_egp * 100.0).round().max(0.0) as u64
}

/// Build the iframe URL for a payment key.
pub fn iframe_url(iframe_id: &str, payment_key: &str) -> String {
    let base = format!("{}/{}", IFRAME_BASE_URL, iframe_id);
    match Url::parse_with_params(&base, &[("payment_token", payment_key)]) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}?payment_token={}", base, payment_key),
    }
}

/// Create a Paymob order and payment key for a card payment.
pub async fn start_card_checkout(
    client: &PaymobClient,
    settings: &CheckoutSettings,
    input: &CardCheckoutInput,
) -> Result<CardCheckout, PaymobError> {
    let amount_cents = amount_to_cents(input.amount_egp);

    info!(
        amount_cents = amount_cents,
        has_merchant_order_id = input.merchant_order_id.is_some(),
        "checkout_start"
    );

    let auth_token = client.auth_token(&settings.api_key).await?;

    let order = client
        .create_order(
            &auth_token,
            &OrderRequest {
                amount_cents,
                currency: CHECKOUT_CURRENCY.to_string(),
                merchant_order_id: input.merchant_order_id.clone(),
                items: Vec::new(),
            },
        )
        .await?;

    let payment_key = client
        .create_payment_key(
            &auth_token,
            &PaymentKeyRequest {
                order_id: order.id,
                amount_cents,
                currency: CHECKOUT_CURRENCY.to_string(),
                billing_data: BillingData::for_customer(&input.customer),
                integration_id: settings.integration_id,
            },
        )
        .await?;

    info!(order_id = order.id, "checkout_payment_key_issued");

    Ok(CardCheckout {
        order_id: order.id,
        iframe_url: iframe_url(&settings.iframe_id, &payment_key),
        payment_key,
    })
}
