//! `SqliteDatabase` is a concrete implementation of a settlement engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the storage traits defined in the [`traits`]
//! module.
//!
//! [`traits`]: crate::traits
use std::{collections::HashMap, fmt::Debug};

use log::*;
use mkt_common::MinorUnits;
use sqlx::SqlitePool;

use super::db::{carts, db_url, new_pool, orders, payouts, products, sellers};
use crate::{
    db_types::{LedgerEntry, NewOrder, NewPayout, Order, OrderItem, Payout, PayoutStatusType, Seller},
    traits::{
        CheckoutError,
        CheckoutLine,
        CheckoutManagement,
        LedgerError,
        PayoutError,
        PayoutManagement,
        PayoutSettlement,
        PayoutSettlementOutcome,
        ReconciliationError,
        RevenueLedger,
        SellerBalance,
        Settlement,
        SettlementManagement,
        SettlementOutcome,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    async fn pair_with_products(&self, requested: Vec<(String, i64)>) -> Result<Vec<CheckoutLine>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        let ids = requested.iter().map(|(id, _)| id.clone()).collect::<Vec<_>>();
        let mut products = products::fetch_products_by_ids(&ids, &mut conn)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect::<HashMap<_, _>>();
        let lines = requested
            .into_iter()
            .map(|(id, quantity)| {
                let product = products.remove(&id);
                CheckoutLine::new(id, quantity, product)
            })
            .collect();
        Ok(lines)
    }
}

impl CheckoutManagement for SqliteDatabase {
    async fn fetch_cart_lines(&self, shopper_id: &str) -> Result<Vec<CheckoutLine>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        let cart = carts::fetch_cart(shopper_id, &mut conn).await?;
        trace!("🗃️ Shopper {shopper_id} has {} items in their cart", cart.len());
        drop(conn);
        let requested = cart.into_iter().map(|item| (item.product_id, item.quantity)).collect();
        Ok(self.pair_with_products(requested).await?)
    }

    async fn fetch_lines_for_items(&self, items: &[(String, i64)]) -> Result<Vec<CheckoutLine>, CheckoutError> {
        Ok(self.pair_with_products(items.to_vec()).await?)
    }

    async fn insert_order(&self, order: NewOrder, clear_cart_for: Option<&str>) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        if let Some(shopper_id) = clear_cart_for {
            let n = carts::clear_cart(shopper_id, &mut tx).await?;
            trace!("🗃️ {n} items cleared from the cart of shopper {shopper_id}");
        }
        tx.commit().await?;
        Ok(order)
    }

    async fn set_payment_url(&self, order_id: i64, url: &str) -> Result<Order, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        orders::set_payment_url(order_id, url, &mut conn).await?.ok_or(CheckoutError::OrderNotFound(order_id))
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_id(order_id, &mut conn).await?)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_items(order_id, &mut conn).await?)
    }
}

impl SettlementManagement for SqliteDatabase {
    async fn fetch_order_by_reference(&self, reference: &str) -> Result<Option<Order>, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_reference(reference, &mut conn).await?)
    }

    async fn fetch_items_for_order(&self, order_id: i64) -> Result<Vec<OrderItem>, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_items(order_id, &mut conn).await?)
    }

    async fn settle_order(
        &self,
        reference: &str,
        outcome: SettlementOutcome,
    ) -> Result<Settlement, ReconciliationError> {
        let mut tx = self.pool.begin().await?;
        // The guarded update is the first statement, so this transaction holds the write lock from here on.
        let order = match orders::transition_pending_order(reference, &outcome, &mut tx).await? {
            Some(order) => order,
            None => {
                let existing = orders::fetch_order_by_reference(reference, &mut tx).await?;
                tx.rollback().await?;
                return match existing {
                    Some(order) => {
                        debug!(
                            "🗃️ Order {} is already {}. Settlement skipped.",
                            order.order_number, order.payment_status
                        );
                        Ok(Settlement::AlreadySettled(order))
                    },
                    None => Err(ReconciliationError::OrderNotFound(reference.to_string())),
                };
            },
        };
        if outcome == SettlementOutcome::Completed {
            let items = orders::fetch_order_items(order.id, &mut tx).await?;
            for item in &items {
                products::decrement_stock(&item.product_id, item.quantity, &mut tx).await?;
            }
            sellers::credit_seller(&order.seller_id, order.id, order.total, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Order {} settled as {}/{}", order.order_number, order.status, order.payment_status);
        Ok(Settlement::Applied(order))
    }
}

impl RevenueLedger for SqliteDatabase {
    async fn fetch_accrued(&self, seller_id: &str) -> Result<MinorUnits, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(sellers::fetch_accrued(seller_id, &mut conn).await?)
    }

    async fn fetch_seller(&self, seller_id: &str) -> Result<Option<Seller>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(sellers::fetch_seller(seller_id, &mut conn).await?)
    }

    async fn fetch_ledger_entries(&self, seller_id: &str) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(sellers::fetch_ledger_entries(seller_id, &mut conn).await?)
    }
}

impl PayoutManagement for SqliteDatabase {
    async fn fetch_balance(&self, seller_id: &str) -> Result<SellerBalance, PayoutError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payouts::fetch_balance(seller_id, &mut conn).await?)
    }

    async fn reserve_payout(&self, payout: NewPayout) -> Result<Payout, PayoutError> {
        let mut tx = self.pool.begin().await?;
        sellers::lock_seller(&payout.seller_id, &mut tx).await?;
        let balance = payouts::fetch_balance(&payout.seller_id, &mut tx).await?;
        let available = balance.available();
        if payout.amount > available {
            tx.rollback().await?;
            return Err(PayoutError::InsufficientBalance { requested: payout.amount, available });
        }
        let payout = payouts::insert_payout(payout, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Payout {} reserved {} of the {available} available to seller {}",
            payout.reference, payout.amount, payout.seller_id
        );
        Ok(payout)
    }

    async fn mark_payout_processing(
        &self,
        reference: &str,
        external_id: &str,
    ) -> Result<Option<Payout>, PayoutError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payouts::mark_processing(reference, external_id, &mut conn).await?)
    }

    async fn settle_payout(
        &self,
        reference: &str,
        outcome: PayoutSettlementOutcome,
    ) -> Result<PayoutSettlement, PayoutError> {
        let mut tx = self.pool.begin().await?;
        let result = match payouts::transition_open_payout(reference, &outcome, &mut tx).await? {
            Some(payout) => PayoutSettlement::Applied(payout),
            None => {
                let existing = payouts::fetch_payout(reference, &mut tx)
                    .await?
                    .ok_or_else(|| PayoutError::PayoutNotFound(reference.to_string()))?;
                debug!("🗃️ Payout {reference} is already {}. Settlement skipped.", existing.status);
                PayoutSettlement::AlreadySettled(existing)
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_payout(&self, reference: &str) -> Result<Option<Payout>, PayoutError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payouts::fetch_payout(reference, &mut conn).await?)
    }

    async fn fetch_payouts_for_seller(
        &self,
        seller_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Payout>, PayoutError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payouts::fetch_payouts_for_seller(seller_id, limit, &mut conn).await?)
    }

    async fn fetch_payouts_with_status(&self, status: PayoutStatusType) -> Result<Vec<Payout>, PayoutError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payouts::fetch_payouts_with_status(status, &mut conn).await?)
    }
}
