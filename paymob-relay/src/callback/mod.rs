//! Paymob callback verification.
//!
//! This module provides:
//! - Parameter bags for query-string and JSON callbacks
//! - Fixed field-order tables and canonicalization
//! - HMAC-SHA512 signature verification
//! - Shape-specific dispatch and the fulfillment extension point
//!
//! ## Flow
//!
//! ```text
//! Callback → ParameterBag → canonicalize(table) → HMAC-SHA512 → Verdict
//! ```

pub mod canonical;
pub mod dispatch;
pub mod fulfillment;
pub mod params;
pub mod signature;

pub use canonical::{canonicalize, FieldOrderTable, PROCESSED_FIELDS, REDIRECTION_FIELDS};
pub use dispatch::{CallbackDispatcher, CallbackShape};
pub use fulfillment::{FulfillmentHook, LogFulfillment};
pub use params::{ParamValue, ParameterBag};
pub use signature::{
    compute_signature, HmacSecret, RejectReason, SignatureVerifier, Verdict, VerifiedTransaction,
    DEFAULT_CURRENCY, SIGNATURE_FIELD,
};

/// Errors that prevent a callback from being verified at all.
///
/// These are operator problems, never a judgement about the callback.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("Missing PAYMOB_HMAC")]
    SecretNotConfigured,
}
