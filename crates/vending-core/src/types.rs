//! # Domain Types
//!
//! Core domain types of the vending machine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Account      │   │    Product      │   │   SaleRecord    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  seller_id (FK) │◄──│  product_id (FK)│       │
//! │  │  username       │   │  name (unique)  │   │  buyer_id (FK)  │──►    │
//! │  │  role           │   │  unit_cost      │   │  quantity       │       │
//! │  │  balance        │   │  amount_avail.  │   │  created_at     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Role       │   │   Principal     │   │ PurchaseReceipt │       │
//! │  │  Buyer          │   │  id + role      │   │ spent + change  │       │
//! │  │  Seller         │   │  (authenticated)│   │ + items         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - `Account.balance >= 0` at every commit point
//! - `Product.amount_available >= 0`, `Product.unit_cost > 0`
//! - `Product.seller_id` never changes after creation
//! - `SaleRecord` is immutable once written

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::change::CoinChange;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{AcceptedDenominations, Money};

// =============================================================================
// Role
// =============================================================================

/// Role of a registered account.
///
/// ## Serialization
/// ```json
/// "buyer"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Deposits coins and buys products.
    Buyer,
    /// Owns and manages products.
    Seller,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buyer" => Ok(Role::Buyer),
            "seller" => Ok(Role::Seller),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["buyer".to_string(), "seller".to_string()],
            }),
        }
    }
}

// =============================================================================
// Principal
// =============================================================================

/// An authenticated caller.
///
/// Produced by the identity provider (token verification lives outside this
/// workspace) or by `authenticate`, then handed to every service call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Principal { id: id.into(), role }
    }
}

// =============================================================================
// Account
// =============================================================================

/// A registered participant.
///
/// `credential_hash` is an argon2 PHC string. It is skipped on serialization
/// and never copied into [`AccountDetails`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Account {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Unique login name.
    pub username: String,

    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub credential_hash: String,

    pub role: Role,

    /// Balance in cents, never negative.
    pub balance: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Returns the caller identity this account authenticates as.
    pub fn principal(&self) -> Principal {
        Principal::new(self.id.clone(), self.role)
    }

    /// Public view of the account.
    pub fn details(&self) -> AccountDetails {
        AccountDetails {
            id: self.id.clone(),
            username: self.username.clone(),
            role: self.role,
            balance: self.balance,
        }
    }

    /// Adds one accepted coin to the balance.
    ///
    /// ## Rules
    /// - The account must be a buyer (`RoleNotPermitted`)
    /// - `amount` must be an accepted denomination (`InvalidAmount`)
    ///
    /// Returns the new balance.
    pub fn deposit(&mut self, amount: i64, accepted: &AcceptedDenominations) -> CoreResult<Money> {
        if self.role != Role::Buyer {
            return Err(CoreError::RoleNotPermitted {
                role: self.role,
                operation: "deposit".to_string(),
            });
        }

        if !accepted.accepts(amount) {
            return Err(CoreError::InvalidAmount {
                amount,
                accepted: accepted.as_slice().to_vec(),
            });
        }

        let balance = Money::from_cents(self.balance)
            .checked_add(Money::from_cents(amount))
            .ok_or_else(|| CoreError::InvalidAmount {
                amount,
                accepted: accepted.as_slice().to_vec(),
            })?;

        self.balance = balance.cents();
        Ok(balance)
    }

    /// Removes `amount` from the balance, refusing to go negative.
    pub fn debit(&mut self, amount: Money) -> CoreResult<Money> {
        if self.balance < amount.cents() {
            return Err(CoreError::InsufficientFunds {
                balance: self.balance,
                required: amount.cents(),
            });
        }

        self.balance -= amount.cents();
        Ok(Money::from_cents(self.balance))
    }

    /// Merges a validated patch into this account.
    pub fn apply_patch(&mut self, patch: &AccountPatch) {
        if let Some(username) = &patch.username {
            self.username = username.trim().to_string();
        }
    }

    /// Zeroes the balance. Idempotent.
    pub fn reset(&mut self) -> Money {
        self.balance = 0;
        Money::zero()
    }
}

/// Account as shown to callers: no credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AccountDetails {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub balance: i64,
}

/// Registration payload.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// Partial account update.
///
/// Only the username can change. The balance moves through deposit, reset
/// and purchases alone; role and credentials are fixed at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AccountPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl AccountPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
    }
}

/// Balance returned by deposit and reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BalanceView {
    pub balance: i64,
}

// =============================================================================
// Product
// =============================================================================

/// A product stocked by a seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, unique across the catalog.
    pub name: String,

    /// Price of one unit in cents, always positive.
    pub unit_cost: i64,

    /// Units left in the machine.
    pub amount_available: i64,

    /// Owning seller account; fixed at creation.
    pub seller_id: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Takes `quantity` units out of stock.
    pub fn decrement_stock(&mut self, quantity: i64) -> CoreResult<()> {
        if self.amount_available < quantity {
            return Err(CoreError::InsufficientStock {
                product_id: self.id.clone(),
                available: self.amount_available,
                requested: quantity,
            });
        }

        self.amount_available -= quantity;
        Ok(())
    }

    /// Merges a patch into this product.
    ///
    /// Absent fields keep their value. The patch must already be validated.
    pub fn apply_patch(&mut self, patch: &ProductPatch) {
        if let Some(name) = &patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(unit_cost) = patch.unit_cost {
            self.unit_cost = unit_cost;
        }
        if let Some(amount_available) = patch.amount_available {
            self.amount_available = amount_available;
        }
    }
}

/// Creation payload; the seller comes from the principal.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub unit_cost: i64,
    pub amount_available: i64,
}

/// Partial product update.
///
/// Each field is applied only when present. `Some(0)` stock is a legal
/// "sold out" update. There is no seller field: ownership never moves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_available: Option<i64>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.unit_cost.is_none() && self.amount_available.is_none()
    }
}

// =============================================================================
// Sales and Receipts
// =============================================================================

/// One committed purchase line. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRecord {
    pub id: String,
    pub buyer_id: String,
    pub product_id: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A product line on a receipt or in a purchase history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchasedItem {
    pub product_id: String,
    pub name: String,
    pub unit_cost: i64,
    pub quantity: i64,
}

impl PurchasedItem {
    pub fn line_total(&self) -> i64 {
        self.unit_cost * self.quantity
    }
}

/// Result of a successful buy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseReceipt {
    pub buyer_id: String,
    pub total_spent: i64,
    pub change: CoinChange,
    pub products_purchased: Vec<PurchasedItem>,
}

/// Everything a buyer has bought so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseHistory {
    pub buyer_id: String,
    pub total_spent: i64,
    pub change: CoinChange,
    pub purchases: Vec<PurchasedItem>,
}

// =============================================================================
// Unit Tests
// =============================================================================
