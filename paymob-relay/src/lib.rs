//! Paymob Relay - backend bridge between a merchant app and Paymob Accept.
//!
//! This library provides the modules behind the `paymob-relay` binary:
//! - `paymob`: Outbound REST calls that create orders and payment keys
//! - `callback`: HMAC verification of redirection and webhook callbacks
//! - `web`: The HTTP endpoints
//!
//! ## Architecture
//!
//! ```text
//! Merchant app → /api/paymob/checkout/card → Paymob (order + payment key)
//! Browser      → /api/paymob/redirection-verify → verdict
//! Paymob       → /webhooks/paymob → verdict → FulfillmentHook
//! ```

pub mod callback;
pub mod config;
pub mod paymob;
pub mod web;

// Re-export commonly used types
pub use callback::{
    CallbackDispatcher, CallbackError, FulfillmentHook, HmacSecret, LogFulfillment,
    ParameterBag, SignatureVerifier, Verdict, VerifiedTransaction,
};
pub use config::{CheckoutSettings, Config, ConfigError};
pub use paymob::{PaymobClient, PaymobError};
pub use web::AppState;
