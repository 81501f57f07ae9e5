use sqlx::SqliteConnection;

use crate::db_types::CartItem;

/// Adds `quantity` units of the product to the shopper's cart, accumulating with any units already there.
pub async fn add_to_cart(
    shopper_id: &str,
    product_id: &str,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartItem, sqlx::Error> {
    let item = sqlx::query_as(
        r#"INSERT INTO cart_items (shopper_id, product_id, quantity) VALUES ($1, $2, $3)
           ON CONFLICT (shopper_id, product_id) DO UPDATE SET quantity = quantity + excluded.quantity
           RETURNING *"#,
    )
    .bind(shopper_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn fetch_cart(shopper_id: &str, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM cart_items WHERE shopper_id = $1 ORDER BY added_at, product_id")
        .bind(shopper_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

pub async fn clear_cart(shopper_id: &str, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE shopper_id = $1").bind(shopper_id).execute(conn).await?;
    Ok(result.rows_affected())
}
