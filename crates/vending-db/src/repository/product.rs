//! # Product Queries
//!
//! SQL for the `products` table.
//!
//! ## Stock Decrement
//! ```text
//! UPDATE products
//!    SET amount_available = amount_available - :qty
//!  WHERE id = :id AND amount_available >= :qty
//!
//!  rows_affected = 1  ──► decremented
//!  rows_affected = 0  ──► absent or not enough stock; nothing written
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;
use vending_core::Product;

use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    unit_cost: i64,
    amount_available: i64,
    seller_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            unit_cost: row.unit_cost,
            amount_available: row.amount_available,
            seller_id: row.seller_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_PRODUCT: &str = r#"
    SELECT id, name, unit_cost, amount_available, seller_id, created_at, updated_at
    FROM products
"#;

pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>(&format!("{} WHERE id = ?", SELECT_PRODUCT))
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(Product::from))
}

pub async fn list(conn: &mut SqliteConnection) -> DbResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!("{} ORDER BY name", SELECT_PRODUCT))
        .fetch_all(conn)
        .await?;

    debug!(count = rows.len(), "Listed products");
    Ok(rows.into_iter().map(Product::from).collect())
}

pub async fn insert(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    debug!(id = %product.id, name = %product.name, "Inserting product");

    sqlx::query(
        r#"
        INSERT INTO products (id, name, unit_cost, amount_available, seller_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(product.unit_cost)
    .bind(product.amount_available)
    .bind(&product.seller_id)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Writes the mutable columns. `seller_id` is not among them.
pub async fn update(conn: &mut SqliteConnection, product: &Product) -> DbResult<bool> {
    debug!(id = %product.id, "Updating product");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET name = ?, unit_cost = ?, amount_available = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&product.name)
    .bind(product.unit_cost)
    .bind(product.amount_available)
    .bind(product.updated_at)
    .bind(&product.id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn decrement_stock(conn: &mut SqliteConnection, id: &str, quantity: i64) -> DbResult<bool> {
    debug!(id = %id, quantity, "Decrementing stock");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET amount_available = amount_available - ?, updated_at = ?
        WHERE id = ? AND amount_available >= ?
        "#,
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(id)
    .bind(quantity)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Sales of the product go with it through `ON DELETE CASCADE`.
pub async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    debug!(id = %id, "Deleting product");

    let result = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() == 1)
}
