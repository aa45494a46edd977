//! Shape-specific entry points for inbound Paymob callbacks.
//!
//! ```text
//! GET  redirection (query string) ─┐
//!                                  ├→ ParameterBag → SignatureVerifier → Verdict
//! POST processed webhook (JSON)  ──┘
//! ```

use tracing::info;

use super::canonical::{FieldOrderTable, PROCESSED_FIELDS, REDIRECTION_FIELDS};
use super::params::ParameterBag;
use super::signature::{SignatureVerifier, Verdict};
use super::CallbackError;

/// The two callback shapes Paymob delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackShape {
    /// Customer's browser returning to the merchant (GET query string).
    Redirection,
    /// Server-to-server transaction-processed notification (POST JSON).
    Processed,
}

impl CallbackShape {
    pub fn field_table(self) -> &'static FieldOrderTable {
        match self {
            CallbackShape::Redirection => &REDIRECTION_FIELDS,
            CallbackShape::Processed => &PROCESSED_FIELDS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CallbackShape::Redirection => "redirection",
            CallbackShape::Processed => "processed",
        }
    }
}

/// Routes each callback shape to the verifier with its field table.
#[derive(Debug, Clone)]
pub struct CallbackDispatcher {
    verifier: SignatureVerifier,
}

impl CallbackDispatcher {
    pub fn new(verifier: SignatureVerifier) -> Self {
        Self { verifier }
    }

    pub fn is_configured(&self) -> bool {
        self.verifier.is_configured()
    }

    /// Verify a browser redirection from its raw query string.
    pub fn redirection(&self, raw_query: Option<&str>) -> Result<Verdict, CallbackError> {
        let bag = ParameterBag::from_query(raw_query.unwrap_or_default());
        self.dispatch(CallbackShape::Redirection, &bag)
    }

    /// Verify a processed webhook from its raw body.
    ///
    /// A body that is missing or not a JSON object is verified as an empty
    /// bag and therefore rejected.
    pub fn processed(&self, body: &[u8]) -> Result<Verdict, CallbackError> {
        let bag = ParameterBag::from_json_slice(body);
        self.dispatch(CallbackShape::Processed, &bag)
    }

    /// Verify an already-built bag as the given shape.
    pub fn dispatch(&self, shape: CallbackShape, bag: &ParameterBag) -> Result<Verdict, CallbackError> {
        let verdict = self.verifier.verify(bag, shape.field_table())?;

        match &verdict {
            Verdict::Verified(tx) => info!(
                shape = shape.as_str(),
                tx_id = ?tx.tx_id,
                order_id = ?tx.order_id,
                success = tx.success,
                "callback_verified"
            ),
            Verdict::Rejected(reason) => info!(
                shape = shape.as_str(),
                reason = reason.as_str(),
                param_count = bag.len(),
                "callback_rejected"
            ),
        }

        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::signature::{HmacSecret, RejectReason};
    use serde_json::json;

    const SAMPLE_HMAC: &str = "bce199eacdd38255612733bfd4199f31a4e8155f28fc74360b37d29fe06520f1d7c7b9ce0909c158e7df0a987f6b7db98e449c88605f7072c97ce4f036f8012f";

    const WEBHOOK_HMAC: &str = "3ed912953cdae0ddca760627b717da1fbbbe454e8f92042905036550057797d77524eabff986a6a6aa138b096678ea191704d3e129a6ac032325a4df1da95727";

    fn dispatcher(key: &str) -> CallbackDispatcher {
        CallbackDispatcher::new(SignatureVerifier::new(HmacSecret::new(key)))
    }

    fn webhook_body(hmac: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "amount_cents": 1000,
            "created_at": "2024-01-01T10:00:00.000000",
            "currency": "EGP",
            "error_occured": false,
            "has_parent_transaction": false,
            "id": 9001,
            "integration_id": 4242,
            "is_3d_secure": true,
            "is_auth": false,
            "is_capture": false,
            "is_refunded": false,
            "is_standalone_payment": false,
            "is_voided": false,
            "order": { "id": 7001 },
            "owner": 302,
            "pending": false,
            "source_data": { "pan": "2346", "sub_type": "MasterCard" },
            "success": true,
            "hmac": hmac
        }))
        .unwrap()
    }

    #[test]
    fn test_redirection_valid_query() {
        let query = format!(
            "amount_cents=10000&currency=EGP&success=true&id=123&order%5Bid%5D=456&hmac={}",
            SAMPLE_HMAC
        );
        let verdict = dispatcher("testsecret").redirection(Some(&query)).unwrap();
        let tx = verdict.transaction().unwrap();

        assert!(tx.success);
        assert_eq!(tx.tx_id.as_deref(), Some("123"));
        assert_eq!(tx.order_id.as_deref(), Some("456"));
        assert_eq!(tx.amount_cents.as_deref(), Some("10000"));
        assert_eq!(tx.currency, "EGP");
    }

    #[test]
    fn test_redirection_repeated_keys_use_first_value() {
        let query = format!(
            "amount_cents=10000&amount_cents=1&currency=EGP&success=true&id=123&order[id]=456&hmac={}&hmac=bogus",
            SAMPLE_HMAC
        );
        assert!(dispatcher("testsecret")
            .redirection(Some(&query))
            .unwrap()
            .is_verified());
    }

    #[test]
    fn test_redirection_without_query_is_rejected() {
        assert_eq!(
            dispatcher("testsecret").redirection(None).unwrap(),
            Verdict::Rejected(RejectReason::MissingSignature)
        );
    }

    #[test]
    fn test_processed_valid_body() {
        let verdict = dispatcher("webhooksecret")
            .processed(&webhook_body(WEBHOOK_HMAC))
            .unwrap();
        let tx = verdict.transaction().unwrap();

        assert!(tx.success);
        assert_eq!(tx.tx_id.as_deref(), Some("9001"));
        assert_eq!(tx.order_id.as_deref(), Some("7001"));
        assert_eq!(tx.amount_cents.as_deref(), Some("1000"));
    }

    #[test]
    fn test_processed_tampered_body_is_rejected() {
        let body = String::from_utf8(webhook_body(WEBHOOK_HMAC))
            .unwrap()
            .replace("\"amount_cents\":1000", "\"amount_cents\":1");
        assert_eq!(
            dispatcher("webhooksecret").processed(body.as_bytes()).unwrap(),
            Verdict::Rejected(RejectReason::Mismatch)
        );
    }

    #[test]
    fn test_processed_malformed_body_is_rejected() {
        let d = dispatcher("webhooksecret");
        for body in [&b""[..], &b"{"[..], &b"null"[..], &b"[]"[..], &b"\"hmac\""[..]] {
            assert!(!d.processed(body).unwrap().is_verified());
        }
    }

    #[test]
    fn test_missing_secret_is_configuration_error() {
        let d = CallbackDispatcher::new(SignatureVerifier::new(None));
        assert!(!d.is_configured());
        assert!(matches!(
            d.redirection(Some("hmac=abc")),
            Err(CallbackError::SecretNotConfigured)
        ));
        assert!(matches!(
            d.processed(&webhook_body(WEBHOOK_HMAC)),
            Err(CallbackError::SecretNotConfigured)
        ));
    }

    #[test]
    fn test_shape_tables() {
        assert_eq!(CallbackShape::Redirection.field_table().name(), "redirection");
        assert_eq!(CallbackShape::Processed.field_table().name(), "processed");
    }
}
