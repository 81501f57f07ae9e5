use serde::{Deserialize, Serialize};

use crate::db_types::{Order, PaymentStatusType, Payout, PayoutStatusType};

/// An order's payment reached a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSettledEvent {
    pub order: Order,
    pub payment_status: PaymentStatusType,
}

impl OrderSettledEvent {
    pub fn new(order: Order) -> Self {
        let payment_status = order.payment_status;
        Self { order, payment_status }
    }
}

/// A payout reached a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutSettledEvent {
    pub payout: Payout,
    pub status: PayoutStatusType,
}

impl PayoutSettledEvent {
    pub fn new(payout: Payout) -> Self {
        let status = payout.status;
        Self { payout, status }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    OrderSettled(OrderSettledEvent),
    PayoutSettled(PayoutSettledEvent),
}
