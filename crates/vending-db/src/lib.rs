//! # vending-db: SQLite Store
//!
//! The SQLite implementation of the engine's storage ports.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vending Data Flow                                │
//! │                                                                         │
//! │  VendingMachine (vending-engine)                                       │
//! │       │  Arc<dyn Store>                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     vending-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌──────────────────┐   ┌──────────────┐ │   │
//! │  │   │   Database    │    │ SqliteUnitOfWork │   │  Migrations  │ │   │
//! │  │   │   (pool.rs)   │───►│  account::       │   │  (embedded)  │ │   │
//! │  │   │  SqlitePool   │    │  product::       │   │ 001_init.sql │ │   │
//! │  │   │  impl Store   │    │  sale::          │   │              │ │   │
//! │  │   └───────────────┘    └──────────────────┘   └──────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (WAL)                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vending_db::{Database, DbConfig};
//! use vending_engine::{VendingConfig, VendingMachine};
//!
//! let config = VendingConfig::from_env()?;
//! let db = Database::new(DbConfig::from(&config)).await?;
//! let machine = VendingMachine::new(Arc::new(db), &config);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::SqliteUnitOfWork;
