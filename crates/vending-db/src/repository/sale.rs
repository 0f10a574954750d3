//! # Sale Queries
//!
//! Sale records are append-only: there is no update statement.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;
use vending_core::SaleRecord;

use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    buyer_id: String,
    product_id: String,
    quantity: i64,
    created_at: DateTime<Utc>,
}

impl From<SaleRow> for SaleRecord {
    fn from(row: SaleRow) -> Self {
        SaleRecord {
            id: row.id,
            buyer_id: row.buyer_id,
            product_id: row.product_id,
            quantity: row.quantity,
            created_at: row.created_at,
        }
    }
}

pub async fn insert(conn: &mut SqliteConnection, sale: &SaleRecord) -> DbResult<()> {
    debug!(id = %sale.id, buyer_id = %sale.buyer_id, product_id = %sale.product_id, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (id, buyer_id, product_id, quantity, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.buyer_id)
    .bind(&sale.product_id)
    .bind(sale.quantity)
    .bind(sale.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn list_for_buyer(conn: &mut SqliteConnection, buyer_id: &str) -> DbResult<Vec<SaleRecord>> {
    let rows = sqlx::query_as::<_, SaleRow>(
        r#"
        SELECT id, buyer_id, product_id, quantity, created_at
        FROM sales
        WHERE buyer_id = ?
        ORDER BY created_at, rowid
        "#,
    )
    .bind(buyer_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(SaleRecord::from).collect())
}
