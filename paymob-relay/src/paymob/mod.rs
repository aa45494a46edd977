//! Paymob Accept REST API.
//!
//! Outbound calls the relay makes to start a card payment:
//!
//! ```text
//! POST /auth/tokens → POST /ecommerce/orders → POST /acceptance/payment_keys
//! ```

pub mod checkout;
pub mod client;
pub mod types;

pub use checkout::{start_card_checkout, CardCheckout, CardCheckoutInput};
pub use client::{PaymobClient, PaymobError};
pub use types::{BillingData, Customer, Order, OrderRequest, PaymentKeyRequest};
