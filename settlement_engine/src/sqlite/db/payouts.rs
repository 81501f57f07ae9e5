use log::debug;
use mkt_common::MinorUnits;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{NewPayout, Payout, PayoutStatusType},
    traits::{PayoutSettlementOutcome, SellerBalance},
};

use super::sellers;

/// Computes the seller's balance from the ledger aggregate and the live payout rows. Nothing here is cached; call it
/// inside the transaction whose decision depends on it.
pub async fn fetch_balance(seller_id: &str, conn: &mut SqliteConnection) -> Result<SellerBalance, sqlx::Error> {
    let seller = sellers::fetch_seller(seller_id, &mut *conn).await?;
    let (total_paid_out, in_flight): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN status = 'COMPLETED' THEN amount ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN status IN ('PENDING', 'PROCESSING') THEN amount ELSE 0 END), 0)
        FROM payouts WHERE seller_id = $1
        "#,
    )
    .bind(seller_id)
    .fetch_one(conn)
    .await?;
    let (total_revenue, total_sales) = seller.map(|s| (s.total_revenue, s.total_sales)).unwrap_or_default();
    Ok(SellerBalance {
        seller_id: seller_id.to_string(),
        total_revenue,
        total_sales,
        total_paid_out: MinorUnits::from(total_paid_out),
        in_flight: MinorUnits::from(in_flight),
    })
}

/// Inserts the payout in `PENDING` status. This is not atomic, and does not check the balance.
pub async fn insert_payout(payout: NewPayout, conn: &mut SqliteConnection) -> Result<Payout, sqlx::Error> {
    let payout: Payout = sqlx::query_as(
        r#"
        INSERT INTO payouts (reference, seller_id, amount, currency, method, account_details, narration)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *;
        "#,
    )
    .bind(payout.reference)
    .bind(payout.seller_id)
    .bind(payout.amount)
    .bind(payout.currency)
    .bind(payout.method.to_string())
    .bind(Json(payout.account_details))
    .bind(payout.narration)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Payout {} of {} saved for seller {}", payout.reference, payout.amount, payout.seller_id);
    Ok(payout)
}

pub async fn fetch_payout(reference: &str, conn: &mut SqliteConnection) -> Result<Option<Payout>, sqlx::Error> {
    let payout =
        sqlx::query_as("SELECT * FROM payouts WHERE reference = $1").bind(reference).fetch_optional(conn).await?;
    Ok(payout)
}

pub async fn fetch_payouts_for_seller(
    seller_id: &str,
    limit: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payout>, sqlx::Error> {
    let limit = limit.unwrap_or(-1);
    let payouts = sqlx::query_as("SELECT * FROM payouts WHERE seller_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2")
        .bind(seller_id)
        .bind(limit)
        .fetch_all(conn)
        .await?;
    Ok(payouts)
}

pub async fn fetch_payouts_with_status(
    status: PayoutStatusType,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payout>, sqlx::Error> {
    let payouts = sqlx::query_as("SELECT * FROM payouts WHERE status = $1 ORDER BY created_at, id")
        .bind(status.to_string())
        .fetch_all(conn)
        .await?;
    Ok(payouts)
}

/// `PENDING` → `PROCESSING`. Returns `None` if the payout was not `PENDING`.
pub(crate) async fn mark_processing(
    reference: &str,
    external_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payout>, sqlx::Error> {
    let payout = sqlx::query_as(
        r#"UPDATE payouts SET status = 'PROCESSING', external_id = $1, updated_at = CURRENT_TIMESTAMP
           WHERE reference = $2 AND status = 'PENDING'
           RETURNING *"#,
    )
    .bind(external_id)
    .bind(reference)
    .fetch_optional(conn)
    .await?;
    Ok(payout)
}

/// Moves a `PENDING` or `PROCESSING` payout into its terminal state. Returns `None` if no non-terminal payout with
/// this reference exists.
pub(crate) async fn transition_open_payout(
    reference: &str,
    outcome: &PayoutSettlementOutcome,
    conn: &mut SqliteConnection,
) -> Result<Option<Payout>, sqlx::Error> {
    let (status, reason) = match outcome {
        PayoutSettlementOutcome::Completed => (PayoutStatusType::Completed, None),
        PayoutSettlementOutcome::Failed(reason) => (PayoutStatusType::Failed, Some(reason.as_str())),
    };
    let payout = sqlx::query_as(
        r#"UPDATE payouts SET
            status = $1,
            failure_reason = $2,
            completed_at = CURRENT_TIMESTAMP,
            updated_at = CURRENT_TIMESTAMP
           WHERE reference = $3 AND status IN ('PENDING', 'PROCESSING')
           RETURNING *"#,
    )
    .bind(status.to_string())
    .bind(reason)
    .bind(reference)
    .fetch_optional(conn)
    .await?;
    Ok(payout)
}
