use std::fmt::Debug;

use log::*;
use mkt_common::MinorUnits;

use crate::{
    db_types::{NewPayout, Payout, PayoutStatusType},
    engine_api::{
        outcomes::decide_payout_settlement,
        payout_objects::{WalletSummary, WithdrawalRequest},
        settings::EngineSettings,
    },
    events::{EventProducers, PayoutSettledEvent},
    helpers::{new_payout_reference, validate_account_details, with_gateway_timeout},
    traits::{
        GatewayError,
        PayoutError,
        PayoutGateway,
        PayoutManagement,
        PayoutOutcome,
        PayoutSettlement,
        PayoutSettlementOutcome,
    },
};

/// The Payout Engine. Computes what a seller can withdraw and drives withdrawals through the provider.
///
/// The available balance is always derived: total revenue from the ledger, minus every payout that is completed or
/// still open (`PENDING` or `PROCESSING`). It is never stored.
pub struct PayoutApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    settings: EngineSettings,
}

impl<B, G> Debug for PayoutApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PayoutApi (min {})", self.settings.minimum_withdrawal)
    }
}

impl<B: Clone, G: Clone> Clone for PayoutApi<B, G> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            gateway: self.gateway.clone(),
            producers: self.producers.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<B, G> PayoutApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers, settings: EngineSettings) -> Self {
        Self { db, gateway, producers, settings }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn minimum_withdrawal(&self) -> MinorUnits {
        self.settings.minimum_withdrawal
    }
}

impl<B, G> PayoutApi<B, G>
where
    B: PayoutManagement,
    G: PayoutGateway,
{
    pub async fn available_balance(&self, seller_id: &str) -> Result<MinorUnits, PayoutError> {
        let balance = self.db.fetch_balance(seller_id).await?;
        Ok(balance.available())
    }

    pub async fn wallet_summary(&self, seller_id: &str) -> Result<WalletSummary, PayoutError> {
        let balance = self.db.fetch_balance(seller_id).await?;
        let recent_payouts = self.db.fetch_payouts_for_seller(seller_id, Some(self.settings.recent_payouts)).await?;
        Ok(WalletSummary {
            available_balance: balance.available(),
            total_revenue: balance.total_revenue,
            total_sales: balance.total_sales,
            total_paid_out: balance.total_paid_out,
            pending_balance: balance.in_flight,
            recent_payouts,
        })
    }

    /// All of the seller's payouts, newest first.
    pub async fn payout_history(&self, seller_id: &str) -> Result<Vec<Payout>, PayoutError> {
        self.db.fetch_payouts_for_seller(seller_id, None).await
    }

    /// Validates and submits a withdrawal.
    ///
    /// Checks, in order: the fixed minimum (independently of the balance), the shape of the account details, and then
    /// the balance, which is recomputed inside the transaction that reserves the funds.
    ///
    /// Once reserved, the payout is submitted to the provider, outside of any transaction:
    /// * accepted: the payout moves to `PROCESSING` and is returned.
    /// * rejected: the payout is stored as `FAILED` with the provider's reason, the funds are released, and
    ///   [`PayoutError::GatewayRejected`] is returned.
    /// * timeout or transport failure: the provider may or may not have the transfer, so the payout stays `PENDING`
    ///   with its funds reserved until the provider's webhook resolves it. [`PayoutError::GatewayUnavailable`] is
    ///   returned.
    pub async fn request_withdrawal(&self, seller_id: &str, request: WithdrawalRequest) -> Result<Payout, PayoutError> {
        let minimum = self.settings.minimum_withdrawal;
        if request.amount < minimum {
            return Err(PayoutError::BelowMinimum { requested: request.amount, minimum });
        }
        validate_account_details(request.method, &request.account_details)?;
        let new_payout = NewPayout {
            reference: new_payout_reference(),
            seller_id: seller_id.to_string(),
            amount: request.amount,
            currency: self.settings.currency.clone(),
            method: request.method,
            account_details: request.account_details,
            narration: request.narration.filter(|n| !n.trim().is_empty()),
        };
        let payout = self.db.reserve_payout(new_payout).await?;
        info!("💸️ Payout {} of {} reserved for seller {seller_id}", payout.reference, payout.amount);
        let submission = with_gateway_timeout(self.settings.gateway_timeout, self.gateway.submit_payout(&payout)).await;
        match submission {
            Ok(submission) => {
                match self.db.mark_payout_processing(&payout.reference, &submission.external_id).await? {
                    Some(p) => {
                        info!("💸️ Payout {} accepted by the provider as {}", p.reference, submission.external_id);
                        Ok(p)
                    },
                    // A webhook for the transfer beat us to it
                    None => self
                        .db
                        .fetch_payout(&payout.reference)
                        .await?
                        .ok_or_else(|| PayoutError::PayoutNotFound(payout.reference.clone())),
                }
            },
            Err(GatewayError::Rejected(reason)) => {
                warn!("💸️ Payout {} was rejected by the provider: {reason}", payout.reference);
                let outcome = PayoutSettlementOutcome::Failed(reason.clone());
                let settlement = self.db.settle_payout(&payout.reference, outcome).await?;
                self.notify_if_applied(&settlement).await;
                Err(PayoutError::GatewayRejected(reason))
            },
            Err(e) => {
                warn!(
                    "💸️ Payout {} could not be confirmed with the provider ({e}). It stays pending until the provider \
                     reports on it.",
                    payout.reference
                );
                Err(PayoutError::GatewayUnavailable(payout.reference))
            },
        }
    }

    /// Applies a transfer outcome reported by the provider, from its webhook or from polling.
    ///
    /// Payouts that are already terminal are returned untouched, so duplicate notifications are harmless.
    pub async fn apply_payout_outcome(&self, outcome: PayoutOutcome) -> Result<PayoutSettlement, PayoutError> {
        let payout = self.db.fetch_payout(&outcome.reference).await?.ok_or_else(|| {
            warn!("💸️ Transfer outcome for unknown payout {}", outcome.reference);
            PayoutError::PayoutNotFound(outcome.reference.clone())
        })?;
        if payout.status.is_terminal() {
            debug!("💸️ Payout {} is already {}. Nothing to do.", payout.reference, payout.status);
            return Ok(PayoutSettlement::AlreadySettled(payout));
        }
        let decision = match decide_payout_settlement(&outcome.reported_status, outcome.message.as_deref()) {
            Some(decision) => decision,
            None => {
                trace!("💸️ Payout {} is still '{}' at the provider", payout.reference, outcome.reported_status);
                return Ok(PayoutSettlement::Pending(payout));
            },
        };
        let settlement = self.db.settle_payout(&outcome.reference, decision).await?;
        self.notify_if_applied(&settlement).await;
        Ok(settlement)
    }

    /// Polls the provider for every payout in `PROCESSING` and applies whatever has resolved.
    ///
    /// Errors for individual payouts are logged and skipped; the next poll tries again.
    pub async fn refresh_processing_payouts(&self) -> Result<Vec<PayoutSettlement>, PayoutError> {
        let open = self.db.fetch_payouts_with_status(PayoutStatusType::Processing).await?;
        trace!("💸️ Polling the provider for {} processing payouts", open.len());
        let mut results = Vec::with_capacity(open.len());
        for payout in open {
            let polled =
                with_gateway_timeout(self.settings.gateway_timeout, self.gateway.fetch_payout_outcome(&payout)).await;
            match polled {
                Ok(outcome) => match self.apply_payout_outcome(outcome).await {
                    Ok(settlement) => results.push(settlement),
                    Err(e) => warn!("💸️ Could not apply polled outcome for payout {}: {e}", payout.reference),
                },
                Err(e) => warn!("💸️ Could not poll payout {}: {e}", payout.reference),
            }
        }
        Ok(results)
    }

    async fn notify_if_applied(&self, settlement: &PayoutSettlement) {
        if let PayoutSettlement::Applied(payout) = settlement {
            info!("💸️ Payout {} is now {}", payout.reference, payout.status);
            self.producers.publish_payout_settled(PayoutSettledEvent::new(payout.clone())).await;
        }
    }
}
