use mkt_common::MinorUnits;
use serde::{Deserialize, Serialize};

use crate::db_types::{AccountDetails, Payout, PayoutMethod};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub amount: MinorUnits,
    pub method: PayoutMethod,
    pub account_details: AccountDetails,
    pub narration: Option<String>,
}

impl WithdrawalRequest {
    pub fn new(amount: MinorUnits, method: PayoutMethod, account_details: AccountDetails) -> Self {
        Self { amount, method, account_details, narration: None }
    }

    pub fn with_narration<S: Into<String>>(mut self, narration: S) -> Self {
        self.narration = Some(narration.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSummary {
    pub available_balance: MinorUnits,
    pub total_revenue: MinorUnits,
    pub total_sales: i64,
    pub total_paid_out: MinorUnits,
    /// Funds in PENDING or PROCESSING payouts.
    pub pending_balance: MinorUnits,
    pub recent_payouts: Vec<Payout>,
}
