//! Seller aggregates and the revenue ledger journal.
use log::{debug, error};
use mkt_common::MinorUnits;
use sqlx::SqliteConnection;

use crate::db_types::{LedgerEntry, Seller};

/// Creates the seller row if it does not exist yet, and otherwise touches it.
///
/// Because this is a write, running it first in a transaction takes SQLite's write lock. Every other writer for any
/// seller waits until the transaction ends, so reads that follow in the same transaction are fresh.
pub async fn lock_seller(seller_id: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO sellers (id) VALUES ($1)
           ON CONFLICT (id) DO UPDATE SET updated_at = CURRENT_TIMESTAMP"#,
    )
    .bind(seller_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_seller(seller_id: &str, conn: &mut SqliteConnection) -> Result<Option<Seller>, sqlx::Error> {
    let seller = sqlx::query_as("SELECT * FROM sellers WHERE id = $1").bind(seller_id).fetch_optional(conn).await?;
    Ok(seller)
}

pub async fn fetch_accrued(seller_id: &str, conn: &mut SqliteConnection) -> Result<MinorUnits, sqlx::Error> {
    let accrued: Option<MinorUnits> = sqlx::query_scalar("SELECT total_revenue FROM sellers WHERE id = $1")
        .bind(seller_id)
        .fetch_optional(conn)
        .await?;
    Ok(accrued.unwrap_or_default())
}

pub async fn fetch_ledger_entries(
    seller_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<LedgerEntry>, sqlx::Error> {
    let entries = sqlx::query_as("SELECT * FROM revenue_ledger WHERE seller_id = $1 ORDER BY id DESC")
        .bind(seller_id)
        .fetch_all(conn)
        .await?;
    Ok(entries)
}

/// Credits the seller with the revenue from a settled order.
///
/// The journal row is keyed on `order_id`, so a second credit for the same order writes nothing and leaves the
/// seller totals untouched. Returns the journal entry if this call made the credit.
///
/// Must only be called from within the settlement transaction.
pub(crate) async fn credit_seller(
    seller_id: &str,
    order_id: i64,
    amount: MinorUnits,
    conn: &mut SqliteConnection,
) -> Result<Option<LedgerEntry>, sqlx::Error> {
    sqlx::query("INSERT INTO sellers (id) VALUES ($1) ON CONFLICT (id) DO NOTHING").bind(seller_id).execute(&mut *conn).await?;
    let entry: Option<LedgerEntry> = sqlx::query_as(
        r#"INSERT INTO revenue_ledger (seller_id, order_id, amount) VALUES ($1, $2, $3)
           ON CONFLICT (order_id) DO NOTHING
           RETURNING *"#,
    )
    .bind(seller_id)
    .bind(order_id)
    .bind(amount)
    .fetch_optional(&mut *conn)
    .await?;
    if entry.is_none() {
        error!(
            "📒️ Order {order_id} has already been credited to seller {seller_id}. The settlement guard should have \
             prevented this. No further credit applied."
        );
        return Ok(None);
    }
    sqlx::query(
        r#"UPDATE sellers SET
            total_revenue = total_revenue + $1,
            total_sales = total_sales + 1,
            updated_at = CURRENT_TIMESTAMP
           WHERE id = $2"#,
    )
    .bind(amount)
    .bind(seller_id)
    .execute(conn)
    .await?;
    debug!("📒️ Seller {seller_id} credited with {amount} for order {order_id}");
    Ok(entry)
}
