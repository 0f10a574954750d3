//! # Error Types
//!
//! Domain-specific error types for vending-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vending-core errors (this file)                                       │
//! │  ├── CoreError        - Caller-visible failures (one ErrorKind each)   │
//! │  └── ValidationError  - Malformed payload fields                       │
//! │                                                                         │
//! │  vending-engine errors                                                 │
//! │  └── StoreError       - Store port failures                            │
//! │                                                                         │
//! │  vending-db errors                                                     │
//! │  └── DbError          - sqlx / SQLite failures                         │
//! │                                                                         │
//! │  Flow: DbError → StoreError → CoreError → transport layer              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, amounts)
//! 3. Callers branch on [`ErrorKind`], never on the message text

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::auth::DenyReason;
use crate::types::Role;

// =============================================================================
// Error Kind
// =============================================================================

/// Stable, machine-readable identifier for every caller-visible failure.
///
/// ## Serialization
/// ```json
/// "INSUFFICIENT_FUNDS"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or missing payload field (400)
    InvalidPayload,
    /// Deposit amount outside the accepted denominations (400)
    InvalidAmount,
    /// The account's role cannot perform this ledger operation (403)
    RoleNotPermitted,
    /// Unique name already taken (409)
    DuplicateName,
    /// Entity absent (404)
    NotFound,
    /// Role or ownership denial from the authorization gate (403)
    Forbidden,
    /// Balance below the purchase cost (422)
    InsufficientFunds,
    /// Stock below the requested quantity (422)
    InsufficientStock,
    /// The purchase transaction aborted and was rolled back (409)
    PurchaseFailed,
    /// Store or infrastructure failure; callers may retry (503)
    StoreUnavailable,
    /// Username/password mismatch (401)
    InvalidCredentials,
}

// =============================================================================
// Core Error
// =============================================================================

/// Caller-visible errors of every core operation.
///
/// Business-rule violations are detected before any commit point. Only
/// [`CoreError::PurchaseFailed`] and [`CoreError::StoreUnavailable`] come from
/// the store, and in both cases the surrounding transaction was rolled back.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Payload validation failed.
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] ValidationError),

    /// Deposit amount is not one of the accepted denominations.
    #[error("Invalid deposit amount {amount}: accepted amounts are {accepted:?}")]
    InvalidAmount { amount: i64, accepted: Vec<i64> },

    /// The account's role does not allow the ledger operation.
    ///
    /// ## When This Occurs
    /// - A seller account tries to deposit coins
    #[error("Role {role} is not permitted to {operation}")]
    RoleNotPermitted { role: Role, operation: String },

    /// Unique constraint on a name was violated.
    #[error("{entity} name '{name}' is already taken")]
    DuplicateName { entity: String, name: String },

    /// Entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The authorization gate denied the principal.
    #[error("Forbidden: {0}")]
    Forbidden(DenyReason),

    /// Buyer balance does not cover the purchase.
    ///
    /// ## User Workflow
    /// ```text
    /// Buy 3 × 65¢ (cost 195¢)
    ///      │
    ///      ▼
    /// Check balance: 150¢
    ///      │
    ///      ▼
    /// InsufficientFunds { balance: 150, required: 195 }
    /// ```
    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: i64, required: i64 },

    /// Product stock does not cover the requested quantity.
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// The purchase transaction aborted; nothing was applied.
    #[error("Purchase failed: {0}")]
    PurchaseFailed(String),

    /// The store could not serve the request.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Username or password did not match.
    #[error("Incorrect username or password")]
    InvalidCredentials,
}

impl CoreError {
    /// Returns the stable kind callers branch on.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidPayload(_) => ErrorKind::InvalidPayload,
            CoreError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            CoreError::RoleNotPermitted { .. } => ErrorKind::RoleNotPermitted,
            CoreError::DuplicateName { .. } => ErrorKind::DuplicateName,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::Forbidden(_) => ErrorKind::Forbidden,
            CoreError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            CoreError::PurchaseFailed(_) => ErrorKind::PurchaseFailed,
            CoreError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            CoreError::InvalidCredentials => ErrorKind::InvalidCredentials,
        }
    }

    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a DuplicateName error.
    pub fn duplicate(entity: impl Into<String>, name: impl Into<String>) -> Self {
        CoreError::DuplicateName {
            entity: entity.into(),
            name: name.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when a payload doesn't meet requirements.
/// Used for early validation before any store access.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Two fields that must differ are equal.
    #[error("{field} can't be the same as {other}")]
    MustDiffer { field: String, other: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for p-1: available 3, requested 5"
        );

        let err = CoreError::RoleNotPermitted {
            role: Role::Seller,
            operation: "deposit".to_string(),
        };
        assert_eq!(err.to_string(), "Role seller is not permitted to deposit");
    }

    #[test]
    fn test_validation_converts_to_invalid_payload() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert_eq!(core_err.kind(), ErrorKind::InvalidPayload);
        assert_eq!(core_err.to_string(), "Invalid payload: name is required");
    }

    #[test]
    fn test_kinds_are_stable_identifiers() {
        let json = serde_json::to_string(&ErrorKind::InsufficientFunds).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_FUNDS\"");

        let err = CoreError::Forbidden(DenyReason::NotOwner);
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(CoreError::InvalidCredentials.kind(), ErrorKind::InvalidCredentials);
        assert_eq!(
            CoreError::not_found("Product", "p-1").kind(),
            ErrorKind::NotFound
        );
    }
}
