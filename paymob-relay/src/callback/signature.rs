//! Paymob callback signature verification.
//!
//! Paymob signs transaction callbacks using HMAC-SHA512 over the
//! concatenation of a fixed list of transaction fields, hex-encoded.

use std::fmt;

use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha512;
use subtle::ConstantTimeEq;
use tracing::warn;

use super::canonical::{canonicalize, FieldOrderTable};
use super::params::ParameterBag;
use super::CallbackError;

type HmacSha512 = Hmac<Sha512>;

/// Key under which the callback carries its claimed signature.
pub const SIGNATURE_FIELD: &str = "hmac";

/// Currency reported when a verified callback does not name one.
pub const DEFAULT_CURRENCY: &str = "EGP";

/// The shared HMAC key issued by Paymob, held as a keyed MAC. Never printed.
///
/// HMAC accepts keys of any length, so keying happens once here and signing
/// afterwards cannot fail.
#[derive(Clone)]
pub struct HmacSecret(HmacSha512);

impl HmacSecret {
    /// Key a MAC. Empty keys are rejected.
    pub fn new(key: impl Into<Vec<u8>>) -> Option<Self> {
        let key = key.into();
        if key.is_empty() {
            return None;
        }
        HmacSha512::new_from_slice(&key).ok().map(Self)
    }

    /// Read a key from an optional environment value; blank means unset.
    pub fn from_env_value(value: Option<String>) -> Option<Self> {
        value.filter(|v| !v.trim().is_empty()).and_then(Self::new)
    }
}

impl fmt::Debug for HmacSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HmacSecret(<redacted>)")
    }
}

/// Business fields of a callback whose signature checked out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedTransaction {
    pub success: bool,
    pub tx_id: Option<String>,
    pub order_id: Option<String>,
    pub amount_cents: Option<String>,
    pub currency: String,
}

impl VerifiedTransaction {
    fn extract(bag: &ParameterBag) -> Self {
        Self {
            success: bag.lookup_str("success").as_deref() == Some("true"),
            tx_id: bag.lookup_str("id"),
            order_id: bag.lookup_str("order.id"),
            amount_cents: bag.lookup_str("amount_cents"),
            currency: bag
                .lookup_str("currency")
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        }
    }
}

/// Why a callback was rejected. For logs only; callers see a bare rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingSignature,
    Mismatch,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MissingSignature => "missing_signature",
            RejectReason::Mismatch => "mismatch",
        }
    }
}

/// Outcome of verifying one callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Verified(VerifiedTransaction),
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verdict::Verified(_))
    }

    /// Business fields, present only when verified.
    pub fn transaction(&self) -> Option<&VerifiedTransaction> {
        match self {
            Verdict::Verified(tx) => Some(tx),
            Verdict::Rejected(_) => None,
        }
    }
}

/// Compute the lowercase hex HMAC-SHA512 of a canonical string.
pub fn compute_signature(secret: &HmacSecret, canonical: &str) -> String {
    let mut mac = secret.0.clone();
    mac.update(canonical.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Verifies callback signatures with a key fixed at construction.
///
/// A verifier built without a key reports [`CallbackError::SecretNotConfigured`]
/// on every call, which callers must surface differently from a rejection.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Option<HmacSecret>,
}

impl SignatureVerifier {
    pub fn new(secret: Option<HmacSecret>) -> Self {
        Self { secret }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    fn secret(&self) -> Result<&HmacSecret, CallbackError> {
        self.secret.as_ref().ok_or(CallbackError::SecretNotConfigured)
    }

    /// Compute the signature Paymob would attach to `bag` for `table`.
    pub fn sign(&self, bag: &ParameterBag, table: &FieldOrderTable) -> Result<String, CallbackError> {
        Ok(compute_signature(self.secret()?, &canonicalize(bag, table)))
    }

    /// Verify the `hmac` field of `bag` against the fields listed in `table`.
    ///
    /// # Returns
    ///
    /// `Ok(Verdict::Verified)` with the extracted business fields when the
    /// claimed signature is non-empty and matches, `Ok(Verdict::Rejected)`
    /// otherwise, and `Err` only when no key is configured.
    pub fn verify(&self, bag: &ParameterBag, table: &FieldOrderTable) -> Result<Verdict, CallbackError> {
        let secret = self.secret()?;

        let claimed = bag.lookup_str(SIGNATURE_FIELD).unwrap_or_default();
        if claimed.is_empty() {
            warn!(table = table.name(), "callback_signature_missing");
            return Ok(Verdict::Rejected(RejectReason::MissingSignature));
        }

        let expected = compute_signature(secret, &canonicalize(bag, table));

        if !constant_time_compare(&expected, &claimed) {
            warn!(
                table = table.name(),
                expected_length = expected.len(),
                actual_length = claimed.len(),
                "callback_signature_mismatch"
            );
            return Ok(Verdict::Rejected(RejectReason::Mismatch));
        }

        Ok(Verdict::Verified(VerifiedTransaction::extract(bag)))
    }
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("configured", &self.is_configured())
            .finish()
    }
}
