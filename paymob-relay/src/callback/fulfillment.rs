//! Extension point invoked after a processed webhook is verified.
//!
//! Order-state transitions belong to the merchant, so the relay only calls a
//! [`FulfillmentHook`]. Returning an error makes the webhook endpoint answer
//! with a 5xx status, which prompts Paymob to deliver the callback again.

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::signature::VerifiedTransaction;

/// Called once per verified processed webhook.
#[async_trait]
pub trait FulfillmentHook: Send + Sync {
    async fn on_verified(&self, transaction: &VerifiedTransaction) -> Result<()>;
}

/// Default hook: records the outcome and does nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFulfillment;

#[async_trait]
impl FulfillmentHook for LogFulfillment {
    async fn on_verified(&self, transaction: &VerifiedTransaction) -> Result<()> {
        if transaction.success {
            info!(
                order_id = ?transaction.order_id,
                tx_id = ?transaction.tx_id,
                amount_cents = ?transaction.amount_cents,
                currency = %transaction.currency,
                "fulfillment_order_paid"
            );
        } else {
            info!(
                order_id = ?transaction.order_id,
                tx_id = ?transaction.tx_id,
                "fulfillment_order_failed"
            );
        }
        Ok(())
    }
}
