use log::{debug, warn};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::{NewProduct, Product};

/// Adds a product to the catalog, creating the seller row if needed. Catalog management proper lives outside the
/// settlement engine; this exists so that the engine can be seeded.
pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    sqlx::query("INSERT INTO sellers (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(&product.seller_id)
        .execute(&mut *conn)
        .await?;
    let product = sqlx::query_as(
        r#"INSERT INTO products (id, seller_id, name, price, stock) VALUES ($1, $2, $3, $4, $5)
           RETURNING *"#,
    )
    .bind(product.id)
    .bind(product.seller_id)
    .bind(product.name)
    .bind(product.price)
    .bind(product.stock)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

pub async fn fetch_product(id: &str, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn fetch_products_by_ids(ids: &[String], conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT * FROM products WHERE id IN (");
    let mut list = builder.separated(", ");
    for id in ids {
        list.push_bind(id);
    }
    list.push_unseparated(")");
    let products = builder.build_query_as::<Product>().fetch_all(conn).await?;
    Ok(products)
}

/// Removes `quantity` units from stock. Stock never goes below zero; if there are not enough units on hand, the
/// oversell is logged and stock is clamped at zero.
pub(crate) async fn decrement_stock(
    product_id: &str,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    let on_hand: Option<i64> =
        sqlx::query_scalar("SELECT stock FROM products WHERE id = $1").bind(product_id).fetch_optional(&mut *conn).await?;
    match on_hand {
        None => {
            warn!("🗃️ Product {product_id} no longer exists. Cannot decrement its stock by {quantity}.");
            return Ok(());
        },
        Some(stock) if stock < quantity => {
            warn!("🗃️ Product {product_id} is oversold. {quantity} units sold, but only {stock} were in stock.");
        },
        Some(_) => {},
    }
    sqlx::query(
        "UPDATE products SET stock = MAX(stock - $1, 0), updated_at = CURRENT_TIMESTAMP WHERE id = $2",
    )
    .bind(quantity)
    .bind(product_id)
    .execute(conn)
    .await?;
    debug!("🗃️ Stock for product {product_id} decremented by {quantity}");
    Ok(())
}
