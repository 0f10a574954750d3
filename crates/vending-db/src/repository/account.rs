//! # Account Queries
//!
//! SQL for the `accounts` table.
//!
//! Balance writes are single statements. The debit carries its own bound
//! (`balance >= ?`) so it can never take the balance below zero, and the
//! schema's CHECK constraint backs that up.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;
use vending_core::{Account, Role};

use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: String,
    username: String,
    credential_hash: String,
    role: Role,
    balance: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            username: row.username,
            credential_hash: row.credential_hash,
            role: row.role,
            balance: row.balance,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_ACCOUNT: &str = r#"
    SELECT id, username, credential_hash, role, balance, created_at, updated_at
    FROM accounts
"#;

pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Account>> {
    let row = sqlx::query_as::<_, AccountRow>(&format!("{} WHERE id = ?", SELECT_ACCOUNT))
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(Account::from))
}

pub async fn get_by_username(conn: &mut SqliteConnection, username: &str) -> DbResult<Option<Account>> {
    let row = sqlx::query_as::<_, AccountRow>(&format!("{} WHERE username = ?", SELECT_ACCOUNT))
        .bind(username)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(Account::from))
}

pub async fn list(conn: &mut SqliteConnection) -> DbResult<Vec<Account>> {
    let rows = sqlx::query_as::<_, AccountRow>(&format!("{} ORDER BY username", SELECT_ACCOUNT))
        .fetch_all(conn)
        .await?;

    Ok(rows.into_iter().map(Account::from).collect())
}

pub async fn insert(conn: &mut SqliteConnection, account: &Account) -> DbResult<()> {
    debug!(id = %account.id, "Inserting account");

    sqlx::query(
        r#"
        INSERT INTO accounts (id, username, credential_hash, role, balance, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&account.id)
    .bind(&account.username)
    .bind(&account.credential_hash)
    .bind(account.role.as_str())
    .bind(account.balance)
    .bind(account.created_at)
    .bind(account.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Writes the username. Balance, role and credentials are left alone.
pub async fn update(conn: &mut SqliteConnection, account: &Account) -> DbResult<bool> {
    debug!(id = %account.id, "Updating account");

    let result = sqlx::query("UPDATE accounts SET username = ?, updated_at = ? WHERE id = ?")
        .bind(&account.username)
        .bind(account.updated_at)
        .bind(&account.id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn update_balance(conn: &mut SqliteConnection, id: &str, balance: i64) -> DbResult<bool> {
    debug!(id = %id, balance, "Updating balance");

    let result = sqlx::query("UPDATE accounts SET balance = ?, updated_at = ? WHERE id = ?")
        .bind(balance)
        .bind(Utc::now())
        .bind(id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn debit(conn: &mut SqliteConnection, id: &str, amount: i64) -> DbResult<bool> {
    debug!(id = %id, amount, "Debiting balance");

    let result = sqlx::query(
        "UPDATE accounts SET balance = balance - ?, updated_at = ? WHERE id = ? AND balance >= ?",
    )
    .bind(amount)
    .bind(Utc::now())
    .bind(id)
    .bind(amount)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Products and sales go with the account through `ON DELETE CASCADE`.
pub async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    debug!(id = %id, "Deleting account");

    let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() == 1)
}
