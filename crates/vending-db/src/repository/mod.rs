//! # Repository Module
//!
//! The SQLite unit of work and the per-table queries it runs.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    SqliteUnitOfWork                                     │
//! │                                                                         │
//! │  Database::begin()  ──►  pool.begin()  (deferred BEGIN)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lock_for_write()   ──►  no-op UPDATE as first statement               │
//! │       │                  takes the writer lock up front, queueing on   │
//! │       │                  the busy timeout like BEGIN IMMEDIATE         │
//! │       ▼                                                                 │
//! │  account:: / product:: / sale::  queries on the same connection        │
//! │       │                                                                 │
//! │       ├── commit()  ──►  COMMIT                                        │
//! │       └── drop      ──►  ROLLBACK (sqlx Transaction drop)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Without the early write, two deferred transactions could both read the
//! same stock and then race to upgrade; under WAL the loser would fail with
//! a snapshot error instead of waiting.

pub mod account;
pub mod product;
pub mod sale;

use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};
use tracing::debug;
use vending_core::{Account, Product, SaleRecord};
use vending_engine::{StoreResult, UnitOfWork};

use crate::error::DbError;

/// One SQLite transaction behind the [`UnitOfWork`] port.
pub struct SqliteUnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl SqliteUnitOfWork {
    pub fn new(tx: Transaction<'static, Sqlite>) -> Self {
        SqliteUnitOfWork { tx }
    }
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
    async fn lock_for_write(&mut self) -> StoreResult<()> {
        debug!("Acquiring write lock");
        sqlx::query("UPDATE accounts SET balance = balance WHERE 0")
            .execute(&mut *self.tx)
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn get_account(&mut self, id: &str) -> StoreResult<Option<Account>> {
        Ok(account::get(&mut self.tx, id).await?)
    }

    async fn get_account_by_username(&mut self, username: &str) -> StoreResult<Option<Account>> {
        Ok(account::get_by_username(&mut self.tx, username).await?)
    }

    async fn list_accounts(&mut self) -> StoreResult<Vec<Account>> {
        Ok(account::list(&mut self.tx).await?)
    }

    async fn insert_account(&mut self, new_account: &Account) -> StoreResult<()> {
        Ok(account::insert(&mut self.tx, new_account).await?)
    }

    async fn update_account(&mut self, changed: &Account) -> StoreResult<bool> {
        Ok(account::update(&mut self.tx, changed).await?)
    }

    async fn update_balance(&mut self, id: &str, balance: i64) -> StoreResult<bool> {
        Ok(account::update_balance(&mut self.tx, id, balance).await?)
    }

    async fn debit_balance(&mut self, id: &str, amount: i64) -> StoreResult<bool> {
        Ok(account::debit(&mut self.tx, id, amount).await?)
    }

    async fn delete_account(&mut self, id: &str) -> StoreResult<bool> {
        Ok(account::delete(&mut self.tx, id).await?)
    }

    async fn get_product(&mut self, id: &str) -> StoreResult<Option<Product>> {
        Ok(product::get(&mut self.tx, id).await?)
    }

    async fn list_products(&mut self) -> StoreResult<Vec<Product>> {
        Ok(product::list(&mut self.tx).await?)
    }

    async fn insert_product(&mut self, new_product: &Product) -> StoreResult<()> {
        Ok(product::insert(&mut self.tx, new_product).await?)
    }

    async fn update_product(&mut self, changed: &Product) -> StoreResult<bool> {
        Ok(product::update(&mut self.tx, changed).await?)
    }

    async fn decrement_stock(&mut self, id: &str, quantity: i64) -> StoreResult<bool> {
        Ok(product::decrement_stock(&mut self.tx, id, quantity).await?)
    }

    async fn delete_product(&mut self, id: &str) -> StoreResult<bool> {
        Ok(product::delete(&mut self.tx, id).await?)
    }

    async fn insert_sale(&mut self, record: &SaleRecord) -> StoreResult<()> {
        Ok(sale::insert(&mut self.tx, record).await?)
    }

    async fn list_sales_for_account(&mut self, buyer_id: &str) -> StoreResult<Vec<SaleRecord>> {
        Ok(sale::list_for_buyer(&mut self.tx, buyer_id).await?)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await.map_err(DbError::from)?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use vending_core::{
        AccountPatch, ErrorKind, NewAccount, NewProduct, Principal, ProductPatch, Role,
    };
    use vending_engine::{Store, StoreError, VendingConfig, VendingMachine};

    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn machine() -> VendingMachine {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        VendingMachine::new(Arc::new(db), &VendingConfig::default())
    }

    async fn account(machine: &VendingMachine, username: &str, role: Role) -> Principal {
        let details = machine
            .register(NewAccount {
                username: username.to_string(),
                password: "pw-123".to_string(),
                role,
            })
            .await
            .unwrap();
        Principal::new(details.id, details.role)
    }

    async fn product(machine: &VendingMachine, seller: &Principal, name: &str, cost: i64, stock: i64) -> Product {
        machine
            .create_product(
                seller,
                NewProduct {
                    name: name.to_string(),
                    unit_cost: cost,
                    amount_available: stock,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_rollback_on_drop() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        let account = Account {
            id: "a-1".to_string(),
            username: "alice".to_string(),
            credential_hash: "hash".to_string(),
            role: Role::Buyer,
            balance: 0,
            created_at: now,
            updated_at: now,
        };

        let mut uow = db.begin().await.unwrap();
        uow.lock_for_write().await.unwrap();
        uow.insert_account(&account).await.unwrap();
        drop(uow);

        let mut uow = db.begin().await.unwrap();
        assert!(uow.get_account("a-1").await.unwrap().is_none());
        uow.insert_account(&account).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = db.begin().await.unwrap();
        let stored = uow.get_account_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Buyer);
        assert_eq!(stored.credential_hash, "hash");
    }

    #[tokio::test]
    async fn test_constraints_are_classified() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        let account = Account {
            id: "a-1".to_string(),
            username: "alice".to_string(),
            credential_hash: "hash".to_string(),
            role: Role::Seller,
            balance: 0,
            created_at: now,
            updated_at: now,
        };

        let mut uow = db.begin().await.unwrap();
        uow.insert_account(&account).await.unwrap();

        let duplicate = Account {
            id: "a-2".to_string(),
            ..account.clone()
        };
        let err = uow.insert_account(&duplicate).await.unwrap_err();
        assert!(err.is_unique_violation());

        let err = uow.update_balance("a-1", -5).await.unwrap_err();
        assert!(matches!(err, StoreError::CheckViolation(_)));

        let orphan = SaleRecord {
            id: "x-1".to_string(),
            buyer_id: "a-1".to_string(),
            product_id: "missing".to_string(),
            quantity: 1,
            created_at: now,
        };
        let err = uow.insert_sale(&orphan).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn test_buy_flow_on_sqlite() {
        let machine = machine().await;
        let seller = account(&machine, "sam", Role::Seller).await;
        let buyer = account(&machine, "bob", Role::Buyer).await;
        let chips = product(&machine, &seller, "Chips", 65, 10).await;

        for coin in [100, 100, 100, 50, 20, 10] {
            machine.deposit(&buyer, coin).await.unwrap();
        }

        let receipt = machine.buy(&buyer, &chips.id, 3).await.unwrap();
        assert_eq!(receipt.total_spent, 195);
        assert_eq!(receipt.change.hundreds, 1);
        assert_eq!(receipt.change.fives, 1);

        assert_eq!(machine.get_account(&buyer, &buyer.id).await.unwrap().balance, 185);
        let stored = machine.get_product(&buyer, &chips.id).await.unwrap();
        assert_eq!(stored.amount_available, 7);

        let err = machine.buy(&buyer, &chips.id, 3).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(machine.get_account(&buyer, &buyer.id).await.unwrap().balance, 185);

        let history = machine.purchase_history(&buyer).await.unwrap();
        assert_eq!(history.total_spent, 195);
        assert_eq!(history.purchases.len(), 1);
    }

    #[tokio::test]
    async fn test_account_rename_on_sqlite() {
        let machine = machine().await;
        let seller = account(&machine, "sam", Role::Seller).await;
        let buyer = account(&machine, "bob", Role::Buyer).await;
        machine.deposit(&buyer, 20).await.unwrap();

        let rename = |name: &str| AccountPatch {
            username: Some(name.to_string()),
        };

        let err = machine.update_account(&buyer, rename("sam")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateName);

        let details = machine.update_account(&buyer, rename("robert")).await.unwrap();
        assert_eq!(details.username, "robert");
        assert_eq!(details.balance, 20);

        let stored = machine.get_account(&seller, &buyer.id).await.unwrap();
        assert_eq!(stored, details);
        assert_eq!(machine.authenticate("robert", "pw-123").await.unwrap(), buyer);
    }

    #[tokio::test]
    async fn test_catalog_rules_on_sqlite() {
        let machine = machine().await;
        let owner = account(&machine, "sam", Role::Seller).await;
        let rival = account(&machine, "rita", Role::Seller).await;
        let cola = product(&machine, &owner, "Cola", 65, 4).await;

        let err = machine
            .create_product(
                &rival,
                NewProduct {
                    name: "Cola".to_string(),
                    unit_cost: 10,
                    amount_available: 1,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateName);

        let err = machine
            .update_product(&rival, &cola.id, ProductPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let sold_out = machine
            .update_product(
                &owner,
                &cola.id,
                ProductPatch {
                    amount_available: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(sold_out.amount_available, 0);
        assert_eq!(sold_out.unit_cost, 65);

        machine.delete_product(&owner, &cola.id).await.unwrap();
        let err = machine.delete_product(&owner, &cola.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_account_delete_cascades() {
        let machine = machine().await;
        let seller = account(&machine, "sam", Role::Seller).await;
        let buyer = account(&machine, "bob", Role::Buyer).await;
        let chips = product(&machine, &seller, "Chips", 50, 5).await;

        machine.deposit(&buyer, 100).await.unwrap();
        machine.buy(&buyer, &chips.id, 1).await.unwrap();

        machine.delete_account(&seller).await.unwrap();

        let err = machine.get_product(&buyer, &chips.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let history = machine.purchase_history(&buyer).await.unwrap();
        assert!(history.purchases.is_empty());
        assert_eq!(machine.get_account(&buyer, &buyer.id).await.unwrap().balance, 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_buys_serialize_on_file_database() {
        let path = std::env::temp_dir().join(format!("vending-{}.db", vending_engine::new_id()));
        let db = Database::new(DbConfig::new(&path).max_connections(4))
            .await
            .unwrap();
        let machine = VendingMachine::new(Arc::new(db.clone()), &VendingConfig::default());

        let seller = account(&machine, "sam", Role::Seller).await;
        let first = account(&machine, "bob", Role::Buyer).await;
        let second = account(&machine, "bea", Role::Buyer).await;
        machine.deposit(&first, 100).await.unwrap();
        machine.deposit(&second, 100).await.unwrap();
        let chips = product(&machine, &seller, "Chips", 50, 1).await;

        let a = {
            let machine = machine.clone();
            let id = chips.id.clone();
            tokio::spawn(async move { machine.buy(&first, &id, 1).await })
        };
        let b = {
            let machine = machine.clone();
            let id = chips.id.clone();
            tokio::spawn(async move { machine.buy(&second, &id, 1).await })
        };
        let outcomes = [a.await.unwrap(), b.await.unwrap()];

        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
        let failure = outcomes.iter().find_map(|o| o.as_ref().err()).unwrap();
        assert_eq!(failure.kind(), ErrorKind::InsufficientStock);

        let stored = machine.get_product(&seller, &chips.id).await.unwrap();
        assert_eq!(stored.amount_available, 0);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
