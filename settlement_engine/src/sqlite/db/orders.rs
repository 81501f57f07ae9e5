use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderItem, PaymentStatusType},
    traits::SettlementOutcome,
};

/// Inserts a new order and its line items using the given connection. This is not atomic. Embed the call inside a
/// transaction and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let NewOrder {
        order_number,
        payment_reference,
        shopper_id,
        seller_id,
        items,
        subtotal,
        tax,
        shipping,
        total,
        currency,
        payment_method,
        delivery_address,
        phone,
    } = order;
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                payment_reference,
                shopper_id,
                seller_id,
                subtotal,
                tax,
                shipping,
                total,
                currency,
                payment_method,
                delivery_address,
                phone
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *;
        "#,
    )
    .bind(order_number)
    .bind(payment_reference)
    .bind(shopper_id)
    .bind(seller_id)
    .bind(subtotal)
    .bind(tax)
    .bind(shipping)
    .bind(total)
    .bind(currency)
    .bind(payment_method)
    .bind(delivery_address)
    .bind(phone)
    .fetch_one(&mut *conn)
    .await?;
    for item in items {
        sqlx::query("INSERT INTO order_items (order_id, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4)")
            .bind(order.id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *conn)
            .await?;
    }
    debug!("🗃️ Order {} saved with id {} and payment reference {}", order.order_number, order.id, order.payment_reference);
    Ok(order)
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE payment_reference = $1")
        .bind(reference)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

pub async fn set_payment_url(id: i64, url: &str, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        "UPDATE orders SET payment_url = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(url)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// The compare-and-set at the heart of settlement. Moves the order out of `PENDING` if, and only if, it is still
/// `PENDING`. Returns `None` when no row matched, meaning the order does not exist or was already settled.
pub(crate) async fn transition_pending_order(
    reference: &str,
    outcome: &SettlementOutcome,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let (payment_status, failure_reason) = match outcome {
        SettlementOutcome::Completed => (PaymentStatusType::Completed, None),
        SettlementOutcome::Failed(reason) => (PaymentStatusType::Failed, Some(reason.to_string())),
    };
    let status = payment_status.order_status();
    trace!("🗃️ Attempting {reference}: PENDING -> {payment_status}");
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = $1,
                payment_status = $2,
                failure_reason = $3,
                settled_at = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
            WHERE payment_reference = $4 AND payment_status = 'PENDING'
            RETURNING *;
        "#,
    )
    .bind(status.to_string())
    .bind(payment_status.to_string())
    .bind(failure_reason)
    .bind(reference)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
