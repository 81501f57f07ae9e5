use std::{collections::HashMap, fmt::Debug};

use cucumber::World;
use settlement_engine::db_types::{Order, Payout};

use crate::support::TestSystem;

#[derive(Default, World)]
pub struct MarketWorld {
    pub system: Option<TestSystem>,
    /// The most recent order placed by each shopper
    pub orders: HashMap<String, Order>,
    /// The most recent successful withdrawal by each seller
    pub payouts: HashMap<String, Payout>,
    pub last_error: Option<String>,
}

impl Debug for MarketWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketWorld")
            .field("db", &self.system.as_ref().map(|s| s.url.as_str()))
            .field("orders", &self.orders.keys().collect::<Vec<_>>())
            .field("payouts", &self.payouts.keys().collect::<Vec<_>>())
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl MarketWorld {
    pub fn system(&self) -> &TestSystem {
        self.system.as_ref().expect("System not initialised. Did you forget 'Given a fresh install'?")
    }

    pub fn order_for(&self, shopper: &str) -> &Order {
        self.orders.get(shopper).unwrap_or_else(|| panic!("{shopper} has not placed an order"))
    }

    pub fn payout_for(&self, seller: &str) -> &Payout {
        self.payouts.get(seller).unwrap_or_else(|| panic!("{seller} has not requested a payout"))
    }
}
