use mkt_common::MinorUnits;
use thiserror::Error;

use crate::db_types::{LedgerEntry, Seller};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

/// Read access to per-seller revenue accruals.
///
/// There is no credit method here. The only writer is the settlement transition in
/// [`crate::traits::SettlementManagement::settle_order`].
#[allow(async_fn_in_trait)]
pub trait RevenueLedger: Clone {
    /// Total revenue ever credited to the seller. Sellers with no sales have accrued zero.
    async fn fetch_accrued(&self, seller_id: &str) -> Result<MinorUnits, LedgerError>;

    async fn fetch_seller(&self, seller_id: &str) -> Result<Option<Seller>, LedgerError>;

    /// Ledger journal for the seller, newest first.
    async fn fetch_ledger_entries(&self, seller_id: &str) -> Result<Vec<LedgerEntry>, LedgerError>;
}
