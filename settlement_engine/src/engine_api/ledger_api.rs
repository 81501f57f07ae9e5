use std::fmt::Debug;

use mkt_common::MinorUnits;

use crate::{
    db_types::{LedgerEntry, Seller},
    traits::{LedgerError, RevenueLedger},
};

/// Read-only access to the Revenue Ledger.
///
/// Credits are not exposed. They are made exclusively by the settlement transition.
pub struct LedgerApi<B> {
    db: B,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B: Clone> Clone for LedgerApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone() }
    }
}

impl<B> LedgerApi<B>
where B: RevenueLedger
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Total revenue ever credited to the seller.
    pub async fn accrued(&self, seller_id: &str) -> Result<MinorUnits, LedgerError> {
        self.db.fetch_accrued(seller_id).await
    }

    pub async fn seller(&self, seller_id: &str) -> Result<Option<Seller>, LedgerError> {
        self.db.fetch_seller(seller_id).await
    }

    pub async fn entries(&self, seller_id: &str) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.db.fetch_ledger_entries(seller_id).await
    }
}
