use std::fmt::Debug;

use log::*;

use crate::{
    engine_api::{outcomes::decide_settlement, settings::EngineSettings},
    events::{EventProducers, OrderSettledEvent},
    helpers::with_gateway_timeout,
    traits::{PaymentGateway, PaymentOutcome, ReconciliationError, Settlement, SettlementManagement, WebhookEvent},
};

/// The Reconciliation Engine. Owns the transition of an order's payment out of `PENDING`.
///
/// Outcomes arrive from two independent paths: a client-triggered verification ([`Self::verify_payment`]) and the
/// provider's webhook ([`Self::authenticate_webhook`] followed by [`Self::apply_payment_outcome`]). The paths race,
/// and webhooks may be delivered more than once. Whatever the interleaving, the side effects of settlement (stock
/// decrement and revenue credit) happen exactly once per order, and once an order is settled no later event changes
/// it.
pub struct ReconciliationApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    settings: EngineSettings,
}

impl<B, G> Debug for ReconciliationApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B: Clone, G: Clone> Clone for ReconciliationApi<B, G> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            gateway: self.gateway.clone(),
            producers: self.producers.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<B, G> ReconciliationApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers, settings: EngineSettings) -> Self {
        Self { db, gateway, producers, settings }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> ReconciliationApi<B, G>
where
    B: SettlementManagement,
    G: PaymentGateway,
{
    /// Checks the webhook signature and, only if it is valid, decodes the body.
    ///
    /// Nothing is read from storage here. An invalid or missing signature is rejected before the body is looked at.
    pub fn authenticate_webhook(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookEvent, ReconciliationError> {
        let valid = signature.map(|sig| self.gateway.validate_webhook_signature(raw_body, sig)).unwrap_or(false);
        if !valid {
            warn!("🧾️ Rejected a webhook with an invalid or missing signature ({} bytes)", raw_body.len());
            return Err(ReconciliationError::InvalidSignature);
        }
        self.gateway.parse_webhook(raw_body).map_err(|e| ReconciliationError::MalformedPayload(e.to_string()))
    }

    /// The verify path. Asks the provider what happened to `transaction_id` and applies the answer.
    ///
    /// If the caller supplies the payment reference it expects (`tx_ref`), the provider's answer must be about that
    /// reference, otherwise nothing is applied.
    pub async fn verify_payment(
        &self,
        transaction_id: &str,
        expected_reference: Option<&str>,
    ) -> Result<Settlement, ReconciliationError> {
        let outcome = with_gateway_timeout(self.settings.gateway_timeout, self.gateway.verify(transaction_id)).await?;
        if let Some(expected) = expected_reference {
            if expected != outcome.reference {
                warn!(
                    "🧾️ Verification of transaction {transaction_id} returned reference {}, but {expected} was \
                     expected. Ignoring it.",
                    outcome.reference
                );
                return Err(ReconciliationError::ReferenceMismatch {
                    expected: expected.to_string(),
                    reported: outcome.reference,
                });
            }
        }
        self.apply_payment_outcome(outcome).await
    }

    /// Applies a payment outcome to the order it refers to.
    ///
    /// * Unknown reference: [`ReconciliationError::OrderNotFound`], no side effects.
    /// * Order already settled: [`Settlement::AlreadySettled`] with the stored outcome, no side effects.
    /// * Outcome not final: [`Settlement::Pending`], no side effects.
    /// * Otherwise the guarded transition runs. If another caller wins the race in the meantime, this caller observes
    ///   [`Settlement::AlreadySettled`].
    pub async fn apply_payment_outcome(&self, outcome: PaymentOutcome) -> Result<Settlement, ReconciliationError> {
        let reference = outcome.reference.as_str();
        let order = self.db.fetch_order_by_reference(reference).await?.ok_or_else(|| {
            warn!("🧾️ Payment outcome for unknown reference {reference}");
            ReconciliationError::OrderNotFound(reference.to_string())
        })?;
        if order.payment_status.is_terminal() {
            debug!("🧾️ Order {} is already {}. Nothing to do.", order.order_number, order.payment_status);
            return Ok(Settlement::AlreadySettled(order));
        }
        let decision = match decide_settlement(&order, &outcome) {
            Some(decision) => decision,
            None => {
                debug!(
                    "🧾️ Provider reports '{}' for order {}. Leaving it pending.",
                    outcome.reported_status, order.order_number
                );
                return Ok(Settlement::Pending(order));
            },
        };
        let settlement = self.db.settle_order(reference, decision).await?;
        match &settlement {
            Settlement::Applied(order) => {
                match &order.failure_reason {
                    Some(reason) => warn!("🧾️ Order {} failed: {reason}", order.order_number),
                    None => info!("🧾️ Order {} is paid. {} credited to {}", order.order_number, order.total, order.seller_id),
                }
                self.producers.publish_order_settled(OrderSettledEvent::new(order.clone())).await;
            },
            Settlement::AlreadySettled(order) => {
                debug!("🧾️ Order {} was settled by a concurrent caller", order.order_number);
            },
            Settlement::Pending(_) => {},
        }
        Ok(settlement)
    }
}
