//! # In-Memory Store
//!
//! A [`Store`] backed by process memory, used by service tests and by
//! callers that need a throwaway machine.
//!
//! ```text
//!   begin()  ── lock whole state (tokio Mutex, owned guard)
//!            ── clone state into `staged`
//!   writes   ── applied to `staged` only
//!   commit() ── copy `staged` back under the same guard
//!   drop     ── `staged` discarded, guard released
//! ```
//!
//! Holding the guard for the lifetime of the unit of work serializes every
//! transaction, so the store offers the same isolation as SQLite's single
//! writer. Uniqueness and cascade rules mirror the SQL schema.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use vending_core::{Account, Product, SaleRecord};

use crate::error::{StoreError, StoreResult};
use crate::store::{Store, UnitOfWork};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    accounts: BTreeMap<String, Account>,
    products: BTreeMap<String, Product>,
    sales: Vec<SaleRecord>,
    #[cfg(test)]
    fail_sale_inserts: bool,
}

/// Process-local store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following sale insert fail, to exercise rollback.
    #[cfg(test)]
    pub(crate) async fn fail_sale_inserts(&self) {
        self.state.lock().await.fail_sale_inserts = true;
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, staged }))
    }
}

struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn lock_for_write(&mut self) -> StoreResult<()> {
        // The guard taken in begin() already excludes every other unit of work.
        Ok(())
    }

    async fn get_account(&mut self, id: &str) -> StoreResult<Option<Account>> {
        Ok(self.staged.accounts.get(id).cloned())
    }

    async fn get_account_by_username(&mut self, username: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .staged
            .accounts
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn list_accounts(&mut self) -> StoreResult<Vec<Account>> {
        let mut accounts: Vec<Account> = self.staged.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(accounts)
    }

    async fn insert_account(&mut self, account: &Account) -> StoreResult<()> {
        if self
            .staged
            .accounts
            .values()
            .any(|a| a.username == account.username)
        {
            return Err(StoreError::UniqueViolation("accounts.username".to_string()));
        }

        debug!(id = %account.id, "Inserting account");
        self.staged
            .accounts
            .insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn update_account(&mut self, account: &Account) -> StoreResult<bool> {
        if self
            .staged
            .accounts
            .values()
            .any(|a| a.username == account.username && a.id != account.id)
        {
            return Err(StoreError::UniqueViolation("accounts.username".to_string()));
        }

        match self.staged.accounts.get_mut(&account.id) {
            Some(existing) => {
                existing.username = account.username.clone();
                existing.updated_at = account.updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_balance(&mut self, id: &str, balance: i64) -> StoreResult<bool> {
        if balance < 0 {
            return Err(StoreError::CheckViolation("accounts.balance".to_string()));
        }

        match self.staged.accounts.get_mut(id) {
            Some(account) => {
                account.balance = balance;
                account.updated_at = chrono::Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn debit_balance(&mut self, id: &str, amount: i64) -> StoreResult<bool> {
        match self.staged.accounts.get_mut(id) {
            Some(account) if account.balance >= amount => {
                account.balance -= amount;
                account.updated_at = chrono::Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_account(&mut self, id: &str) -> StoreResult<bool> {
        if self.staged.accounts.remove(id).is_none() {
            return Ok(false);
        }

        let owned: Vec<String> = self
            .staged
            .products
            .values()
            .filter(|p| p.seller_id == id)
            .map(|p| p.id.clone())
            .collect();
        for product_id in &owned {
            self.staged.products.remove(product_id);
        }

        self.staged
            .sales
            .retain(|s| s.buyer_id != id && !owned.contains(&s.product_id));
        Ok(true)
    }

    async fn get_product(&mut self, id: &str) -> StoreResult<Option<Product>> {
        Ok(self.staged.products.get(id).cloned())
    }

    async fn list_products(&mut self) -> StoreResult<Vec<Product>> {
        let mut products: Vec<Product> = self.staged.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn insert_product(&mut self, product: &Product) -> StoreResult<()> {
        if self.staged.products.values().any(|p| p.name == product.name) {
            return Err(StoreError::UniqueViolation("products.name".to_string()));
        }
        if !self.staged.accounts.contains_key(&product.seller_id) {
            return Err(StoreError::ForeignKeyViolation("products.seller_id".to_string()));
        }

        self.staged
            .products
            .insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn update_product(&mut self, product: &Product) -> StoreResult<bool> {
        if self
            .staged
            .products
            .values()
            .any(|p| p.name == product.name && p.id != product.id)
        {
            return Err(StoreError::UniqueViolation("products.name".to_string()));
        }
        if product.amount_available < 0 || product.unit_cost <= 0 {
            return Err(StoreError::CheckViolation("products".to_string()));
        }

        match self.staged.products.get_mut(&product.id) {
            Some(existing) => {
                existing.name = product.name.clone();
                existing.unit_cost = product.unit_cost;
                existing.amount_available = product.amount_available;
                existing.updated_at = product.updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn decrement_stock(&mut self, id: &str, quantity: i64) -> StoreResult<bool> {
        match self.staged.products.get_mut(id) {
            Some(product) if product.amount_available >= quantity => {
                product.amount_available -= quantity;
                product.updated_at = chrono::Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_product(&mut self, id: &str) -> StoreResult<bool> {
        if self.staged.products.remove(id).is_none() {
            return Ok(false);
        }
        self.staged.sales.retain(|s| s.product_id != id);
        Ok(true)
    }

    async fn insert_sale(&mut self, sale: &SaleRecord) -> StoreResult<()> {
        #[cfg(test)]
        if self.staged.fail_sale_inserts {
            return Err(StoreError::Unavailable("sale insert rejected".to_string()));
        }
        if !self.staged.accounts.contains_key(&sale.buyer_id) {
            return Err(StoreError::ForeignKeyViolation("sales.buyer_id".to_string()));
        }
        if !self.staged.products.contains_key(&sale.product_id) {
            return Err(StoreError::ForeignKeyViolation("sales.product_id".to_string()));
        }

        self.staged.sales.push(sale.clone());
        Ok(())
    }

    async fn list_sales_for_account(&mut self, buyer_id: &str) -> StoreResult<Vec<SaleRecord>> {
        Ok(self
            .staged
            .sales
            .iter()
            .filter(|s| s.buyer_id == buyer_id)
            .cloned()
            .collect())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryUnitOfWork { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
