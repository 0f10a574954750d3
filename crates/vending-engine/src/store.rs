//! # Store Ports
//!
//! The narrow repository interface every service depends on.
//!
//! ## Unit of Work Lifecycle
//! ```text
//!   store.begin() ──► Box<dyn UnitOfWork>
//!                          │
//!                          ├── lock_for_write()      (mutating operations)
//!                          ├── get_* / list_*        (reads see own writes)
//!                          ├── insert_* / update_* / delete_*
//!                          │
//!                          ├── commit() ──► changes visible to everyone
//!                          └── drop     ──► changes discarded
//! ```
//!
//! Guarded writes ([`UnitOfWork::decrement_stock`],
//! [`UnitOfWork::debit_balance`]) re-check their bound in the store itself and
//! report `false` instead of writing a negative value.

use async_trait::async_trait;
use vending_core::{Account, Product, SaleRecord};

use crate::error::StoreResult;

/// Factory of transactional units of work.
#[async_trait]
pub trait Store: Send + Sync {
    /// Opens a new unit of work.
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>>;
}

/// One store transaction.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Serializes this unit of work against every other writer.
    ///
    /// Must be called before the first read of a read-modify-write sequence.
    async fn lock_for_write(&mut self) -> StoreResult<()>;

    // -------------------------------------------------------------------------
    // Accounts
    // -------------------------------------------------------------------------

    async fn get_account(&mut self, id: &str) -> StoreResult<Option<Account>>;

    async fn get_account_by_username(&mut self, username: &str) -> StoreResult<Option<Account>>;

    /// All accounts, ordered by username.
    async fn list_accounts(&mut self) -> StoreResult<Vec<Account>>;

    /// Fails with `UniqueViolation` when the username is taken.
    async fn insert_account(&mut self, account: &Account) -> StoreResult<()>;

    /// Writes the username. Balance, role and credentials are never written.
    ///
    /// Fails with `UniqueViolation` when the username is taken.
    async fn update_account(&mut self, account: &Account) -> StoreResult<bool>;

    /// Overwrites the balance. Returns `false` if the account is absent.
    async fn update_balance(&mut self, id: &str, balance: i64) -> StoreResult<bool>;

    /// Subtracts `amount` only if the balance covers it.
    async fn debit_balance(&mut self, id: &str, amount: i64) -> StoreResult<bool>;

    /// Deletes the account with its products and sale records.
    async fn delete_account(&mut self, id: &str) -> StoreResult<bool>;

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    async fn get_product(&mut self, id: &str) -> StoreResult<Option<Product>>;

    /// All products, ordered by name.
    async fn list_products(&mut self) -> StoreResult<Vec<Product>>;

    /// Fails with `UniqueViolation` when the name is taken.
    async fn insert_product(&mut self, product: &Product) -> StoreResult<()>;

    /// Writes name, unit cost and stock. The seller id is never written.
    async fn update_product(&mut self, product: &Product) -> StoreResult<bool>;

    /// Subtracts `quantity` only if the stock covers it.
    async fn decrement_stock(&mut self, id: &str, quantity: i64) -> StoreResult<bool>;

    /// Deletes the product with its sale records.
    async fn delete_product(&mut self, id: &str) -> StoreResult<bool>;

    // -------------------------------------------------------------------------
    // Sales
    // -------------------------------------------------------------------------

    async fn insert_sale(&mut self, sale: &SaleRecord) -> StoreResult<()>;

    /// Sale records of one buyer, oldest first.
    async fn list_sales_for_account(&mut self, buyer_id: &str) -> StoreResult<Vec<SaleRecord>>;

    /// Makes every write of this unit of work durable.
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
