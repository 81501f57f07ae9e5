use thiserror::Error;

use crate::{
    db_types::{Order, OrderItem},
    traits::{
        data_objects::{Settlement, SettlementOutcome},
        GatewayError,
    },
};

#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Webhook signature is invalid")]
    InvalidSignature,
    #[error("No order exists with payment reference {0}")]
    OrderNotFound(String),
    #[error("The provider reports reference {reported}, but {expected} was supplied")]
    ReferenceMismatch { expected: String, reported: String },
    #[error("Malformed payment notification: {0}")]
    MalformedPayload(String),
    #[error("Payment provider error: {0}")]
    Gateway(#[from] GatewayError),
}

impl From<sqlx::Error> for ReconciliationError {
    fn from(e: sqlx::Error) -> Self {
        ReconciliationError::DatabaseError(e.to_string())
    }
}

/// Storage behaviour the Reconciliation Engine needs.
#[allow(async_fn_in_trait)]
pub trait SettlementManagement: Clone {
    async fn fetch_order_by_reference(&self, reference: &str) -> Result<Option<Order>, ReconciliationError>;

    async fn fetch_items_for_order(&self, order_id: i64) -> Result<Vec<OrderItem>, ReconciliationError>;

    /// Moves the order identified by `reference` out of `PENDING` and applies the side effects of the outcome, all in
    /// one atomic unit of work.
    ///
    /// The transition is a compare-and-set on `payment_status = 'PENDING'`. Exactly one caller can win it. A caller
    /// that loses the race (or arrives after the order was settled) receives [`Settlement::AlreadySettled`] with the
    /// stored order and no side effects are applied.
    ///
    /// On [`SettlementOutcome::Completed`], stock is decremented for every line item and the seller's revenue ledger
    /// is credited with the order total. [`SettlementOutcome::Failed`] has no inventory or ledger effect.
    async fn settle_order(
        &self,
        reference: &str,
        outcome: SettlementOutcome,
    ) -> Result<Settlement, ReconciliationError>;
}
