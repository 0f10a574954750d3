//! # vending-engine: Vending Machine Services
//!
//! The three services of the machine, written against an abstract
//! transactional store so that SQLite and the in-memory store are
//! interchangeable.
//!
//! ## Service Wiring
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          VendingMachine                                 │
//! │                                                                         │
//! │   ┌───────────────┐   ┌───────────────┐   ┌───────────────────────┐    │
//! │   │ AccountLedger │   │ CatalogStore  │   │    PurchaseEngine     │    │
//! │   │ register      │   │ create        │   │ buy                   │    │
//! │   │ authenticate  │   │ update        │   │ history               │    │
//! │   │ deposit/reset │   │ delete        │   │  (ledger + catalog +  │    │
//! │   │ debit*        │   │ decrement*    │   │   coin change)        │    │
//! │   └───────┬───────┘   └───────┬───────┘   └───────────┬───────────┘    │
//! │           └───────────────────┼───────────────────────┘                │
//! │                               ▼                                         │
//! │                    Arc<dyn Store> ── begin() ──► Box<dyn UnitOfWork>    │
//! │                    (Database | MemoryStore)     commit() or drop        │
//! │                                                                         │
//! │   * runs inside the caller's unit of work                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transactions
//! Every mutating operation opens exactly one unit of work, calls
//! [`UnitOfWork::lock_for_write`] before its first read, and commits
//! explicitly. Any early return drops the unit of work, which rolls it back.

pub mod catalog;
pub mod config;
pub mod credentials;
pub mod error;
pub mod ledger;
pub mod machine;
pub mod memory;
pub mod purchase;
pub mod store;

pub use catalog::CatalogStore;
pub use config::{ConfigError, VendingConfig};
pub use error::{StoreError, StoreResult};
pub use ledger::AccountLedger;
pub use machine::VendingMachine;
pub use memory::MemoryStore;
pub use purchase::PurchaseEngine;
pub use store::{Store, UnitOfWork};

/// Generates a new entity id (UUID v4).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
