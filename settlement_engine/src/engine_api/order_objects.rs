use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderItem},
    traits::ChargeSession,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub product_id: String,
    pub quantity: i64,
}

impl CheckoutItem {
    pub fn new<S: Into<String>>(product_id: S, quantity: i64) -> Self {
        Self { product_id: product_id.into(), quantity }
    }
}

/// What the shopper asks for at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Explicit items to buy. When absent, the shopper's cart is checked out and cleared.
    pub items: Option<Vec<CheckoutItem>>,
    pub delivery_address: String,
    pub payment_method: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl CheckoutRequest {
    pub fn from_cart<S: Into<String>>(delivery_address: S, payment_method: S) -> Self {
        Self { delivery_address: delivery_address.into(), payment_method: payment_method.into(), ..Default::default() }
    }

    pub fn with_items(mut self, items: Vec<CheckoutItem>) -> Self {
        self.items = Some(items);
        self
    }

    pub fn with_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// A priced order and the hosted payment session that was opened for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResult {
    pub order: Order,
    pub session: ChargeSession,
}
