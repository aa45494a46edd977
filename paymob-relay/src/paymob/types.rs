//! Request and response bodies for the Paymob Accept REST API.

use serde::{Deserialize, Serialize};

/// Body of `POST /auth/tokens`.
#[derive(Debug, Serialize)]
pub(crate) struct AuthRequest<'a> {
    pub api_key: &'a str,
}

/// Any Paymob response carrying a `token` (auth token or payment key).
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub token: String,
}

/// Order to register with Paymob.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    /// Amount in minor units (piasters for EGP)
    pub amount_cents: u64,
    pub currency: String,
    /// The merchant's own reference, echoed back on callbacks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_order_id: Option<String>,
    pub items: Vec<serde_json::Value>,
}

/// Body of `POST /ecommerce/orders`.
#[derive(Debug, Serialize)]
pub(crate) struct CreateOrderBody<'a> {
    pub auth_token: &'a str,
    pub delivery_needed: bool,
    #[serde(flatten)]
    pub order: &'a OrderRequest,
}

/// An order as returned by Paymob. Only the fields the relay reads are typed.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: u64,
    #[serde(default)]
    pub amount_cents: Option<u64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub merchant_order_id: Option<String>,
}

/// Customer details supplied by the merchant app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

/// Billing block required by the payment-key endpoint.
///
/// Paymob rejects the request if any field is absent, so address fields the
/// relay does not collect are filled with placeholders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingData {
    pub apartment: String,
    pub floor: String,
    pub street: String,
    pub building: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub city: String,
    pub country: String,
    pub state: String,
    pub shipping_method: String,
    pub postal_code: String,
}

impl BillingData {
    pub fn for_customer(customer: &Customer) -> Self {
        let na = || "NA".to_string();
        Self {
            apartment: na(),
            floor: na(),
            street: na(),
            building: na(),
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            email: customer.email.clone(),
            phone_number: customer.phone_number.clone(),
            city: "Cairo".to_string(),
            country: "EG".to_string(),
            state: "Cairo".to_string(),
            shipping_method: na(),
            postal_code: "00000".to_string(),
        }
    }
}

/// Payment key to request for an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentKeyRequest {
    pub order_id: u64,
    pub amount_cents: u64,
    pub currency: String,
    pub billing_data: BillingData,
    pub integration_id: u64,
}

/// Body of `POST /acceptance/payment_keys`.
#[derive(Debug, Serialize)]
pub(crate) struct PaymentKeyBody<'a> {
    pub auth_token: &'a str,
    /// Key lifetime in seconds
    pub expiration: u64,
    #[serde(flatten)]
    pub request: &'a PaymentKeyRequest,
}
