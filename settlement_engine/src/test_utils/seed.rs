use mkt_common::MinorUnits;

use crate::{
    db_types::{NewProduct, Order, Product},
    sqlite::db::{carts, products},
    traits::{PaymentOutcome, SettlementManagement, SettlementOutcome},
    SqliteDatabase,
};

pub async fn seed_product(db: &SqliteDatabase, id: &str, seller_id: &str, price: i64, stock: i64) -> Product {
    let mut conn = db.pool().acquire().await.unwrap();
    let product = NewProduct::new(id, seller_id, id, MinorUnits::from(price), stock);
    products::insert_product(product, &mut conn).await.unwrap()
}

pub async fn add_to_cart(db: &SqliteDatabase, shopper_id: &str, product_id: &str, quantity: i64) {
    let mut conn = db.pool().acquire().await.unwrap();
    carts::add_to_cart(shopper_id, product_id, quantity, &mut conn).await.unwrap();
}

/// The outcome a provider would report for a successful payment of the full order total.
pub fn completed_outcome(order: &Order, transaction_id: &str) -> PaymentOutcome {
    PaymentOutcome {
        reference: order.payment_reference.clone(),
        transaction_id: transaction_id.to_string(),
        amount: order.total,
        currency: order.currency.clone(),
        reported_status: "successful".into(),
    }
}

/// Settles the order as paid straight through the backend, crediting its seller.
pub async fn settle_paid_order(db: &SqliteDatabase, order: &Order) -> Order {
    db.settle_order(&order.payment_reference, SettlementOutcome::Completed).await.unwrap().into_order()
}
