use std::fmt::Display;

use mkt_common::MinorUnits;
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Payout, Product};

/// A requested line item, paired with the live product it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub product_id: String,
    pub quantity: i64,
    pub product: Option<Product>,
}

impl CheckoutLine {
    pub fn new<S: Into<String>>(product_id: S, quantity: i64, product: Option<Product>) -> Self {
        Self { product_id: product_id.into(), quantity, product }
    }
}

/// Why a payment was settled as failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// The provider reported a different amount to the order total.
    AmountMismatch { expected: MinorUnits, reported: MinorUnits },
    /// The provider reported a different currency to the order currency.
    CurrencyMismatch { expected: String, reported: String },
    /// The provider reported the payment as unsuccessful. Holds the provider's status text.
    Declined(String),
}

impl Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AmountMismatch { expected, reported } => {
                write!(f, "AMOUNT_MISMATCH: expected {expected}, provider reported {reported}")
            },
            Self::CurrencyMismatch { expected, reported } => {
                write!(f, "CURRENCY_MISMATCH: expected {expected}, provider reported {reported}")
            },
            Self::Declined(status) => write!(f, "DECLINED: provider status '{status}'"),
        }
    }
}

/// The terminal outcome to apply to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementOutcome {
    Completed,
    Failed(FailureReason),
}

/// Result of an attempt to settle an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Settlement {
    /// This call performed the transition and its side effects.
    Applied(Order),
    /// The order had already been settled. Nothing was changed. Holds the order as stored.
    AlreadySettled(Order),
    /// The provider has not reported a final outcome yet. The order was left untouched.
    Pending(Order),
}

impl Settlement {
    pub fn order(&self) -> &Order {
        match self {
            Self::Applied(o) | Self::AlreadySettled(o) | Self::Pending(o) => o,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            Self::Applied(o) | Self::AlreadySettled(o) | Self::Pending(o) => o,
        }
    }

    pub fn was_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoutSettlementOutcome {
    Completed,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoutSettlement {
    Applied(Payout),
    AlreadySettled(Payout),
    /// No final outcome from the provider yet.
    Pending(Payout),
}

impl PayoutSettlement {
    pub fn payout(&self) -> &Payout {
        match self {
            Self::Applied(p) | Self::AlreadySettled(p) | Self::Pending(p) => p,
        }
    }

    pub fn was_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// A derived, never-persisted view of a seller's funds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerBalance {
    pub seller_id: String,
    pub total_revenue: MinorUnits,
    pub total_sales: i64,
    /// Sum of COMPLETED payouts.
    pub total_paid_out: MinorUnits,
    /// Sum of PENDING and PROCESSING payouts.
    pub in_flight: MinorUnits,
}

impl SellerBalance {
    pub fn available(&self) -> MinorUnits {
        self.total_revenue - self.total_paid_out - self.in_flight
    }
}
