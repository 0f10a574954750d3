//! # vending-core: Pure Business Rules for the Vending Machine
//!
//! This crate is the **heart** of the vending machine. It contains every
//! money, stock and permission rule as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Vending Machine Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           Transport (HTTP, tokens) - outside workspace          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Principal + command                    │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    vending-engine (services)                    │   │
//! │  │        AccountLedger, CatalogStore, PurchaseEngine              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vending-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐  │   │
//! │  │   │  types  │ │  money  │ │ change  │ │   auth   │ │purchase│  │   │
//! │  │   │ Account │ │  Money  │ │ greedy  │ │  gate    │ │  plan  │  │   │
//! │  │   │ Product │ │ accepted│ │ coins   │ │ roles +  │ │        │  │   │
//! │  │   │  Sale   │ │ coins   │ │         │ │ owner    │ │        │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   vending-db (SQLite store)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Account, Product, SaleRecord, receipts)
//! - [`money`] - Money type and the accepted deposit denominations
//! - [`change`] - Greedy coin change calculator
//! - [`auth`] - Authorization gate (role and ownership predicate)
//! - [`purchase`] - Purchase planning (funds and stock checks)
//! - [`validation`] - Payload validation
//! - [`error`] - Domain error types and stable error kinds
//!
//! ## Example Usage
//!
//! ```rust
//! use vending_core::change::compute_change;
//!
//! let change = compute_change(185);
//! assert_eq!(change.hundreds, 1);
//! assert_eq!(change.fifties, 1);
//! assert_eq!(change.twenties, 1);
//! assert_eq!(change.tens, 1);
//! assert_eq!(change.fives, 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod change;
pub mod error;
pub mod money;
pub mod purchase;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use auth::{authorize, Authorization, DenyReason};
pub use change::{compute_change, CoinChange};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::{AcceptedDenominations, Money};
pub use purchase::{plan_purchase, PurchasePlan};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a username or product name.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum units of a single product bought in one purchase.
pub const MAX_PURCHASE_QUANTITY: i64 = 999;
