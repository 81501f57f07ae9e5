use mkt_common::MinorUnits;
use thiserror::Error;

use crate::{
    db_types::{NewPayout, Payout, PayoutStatusType},
    traits::data_objects::{PayoutSettlement, PayoutSettlementOutcome, SellerBalance},
};

#[derive(Debug, Clone, Error)]
pub enum PayoutError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Insufficient balance. Requested {requested}, but only {available} is available")]
    InsufficientBalance { requested: MinorUnits, available: MinorUnits },
    #[error("The minimum withdrawal is {minimum}, but {requested} was requested")]
    BelowMinimum { requested: MinorUnits, minimum: MinorUnits },
    #[error("Invalid account details: {0}")]
    InvalidAccountDetails(String),
    #[error("The payment provider rejected the payout: {0}")]
    GatewayRejected(String),
    #[error("The payment provider could not be reached. Payout {0} is pending and its funds remain reserved")]
    GatewayUnavailable(String),
    #[error("Payout {0} does not exist")]
    PayoutNotFound(String),
}

impl From<sqlx::Error> for PayoutError {
    fn from(e: sqlx::Error) -> Self {
        PayoutError::DatabaseError(e.to_string())
    }
}

/// Storage behaviour the Payout Engine needs.
#[allow(async_fn_in_trait)]
pub trait PayoutManagement: Clone {
    /// Computes the seller's balance from the revenue ledger and the live payout rows.
    async fn fetch_balance(&self, seller_id: &str) -> Result<SellerBalance, PayoutError>;

    /// Creates the payout in `PENDING`.
    ///
    /// The available balance is recomputed inside the same transaction that inserts the row, and that transaction
    /// holds the seller's write lock for its duration, so two concurrent requests cannot both spend the same funds.
    /// Fails with [`PayoutError::InsufficientBalance`] if `payout.amount` exceeds the fresh balance.
    async fn reserve_payout(&self, payout: NewPayout) -> Result<Payout, PayoutError>;

    /// `PENDING` → `PROCESSING`, recording the provider's id for the transfer. Returns `None` if the payout was no
    /// longer `PENDING` (e.g. a webhook got there first).
    async fn mark_payout_processing(&self, reference: &str, external_id: &str)
        -> Result<Option<Payout>, PayoutError>;

    /// Moves a non-terminal payout into a terminal state. The same compare-and-set discipline as order settlement
    /// applies: only one caller ever performs the transition.
    async fn settle_payout(
        &self,
        reference: &str,
        outcome: PayoutSettlementOutcome,
    ) -> Result<PayoutSettlement, PayoutError>;

    async fn fetch_payout(&self, reference: &str) -> Result<Option<Payout>, PayoutError>;

    /// The seller's payouts, newest first.
    async fn fetch_payouts_for_seller(&self, seller_id: &str, limit: Option<i64>) -> Result<Vec<Payout>, PayoutError>;

    async fn fetch_payouts_with_status(&self, status: PayoutStatusType) -> Result<Vec<Payout>, PayoutError>;
}
