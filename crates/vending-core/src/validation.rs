//! # Validation Module
//!
//! Payload validation run before any store access.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport (outside workspace)                                │
//! │  └── Deserialization into NewAccount / NewProduct / ProductPatch       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Required fields, lengths, positive costs and quantities           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store                                                        │
//! │  ├── UNIQUE (username, product name)                                   │
//! │  ├── CHECK (balance >= 0, amount_available >= 0, unit_cost > 0)        │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vending_core::validation::{validate_product_name, validate_quantity};
//!
//! assert!(validate_product_name("Cola").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{AccountPatch, NewAccount, NewProduct, ProductPatch};
use crate::{MAX_NAME_LENGTH, MAX_PURCHASE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates a username: non-empty and at most 100 characters.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    validate_name("username", username)
}

/// Validates a product name: non-empty and at most 100 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name)
}

/// Validates a password against its username.
///
/// ## Rules
/// - Must not be empty
/// - Must differ from the username
pub fn validate_password(username: &str, password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password == username {
        return Err(ValidationError::MustDiffer {
            field: "password".to_string(),
            other: "username".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a unit cost in cents (must be positive).
pub fn validate_unit_cost(unit_cost: i64) -> ValidationResult<()> {
    if unit_cost <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "unit_cost".to_string(),
        });
    }
    Ok(())
}

/// Validates a purchase quantity (1 to 999).
///
/// ## Example
/// ```rust
/// use vending_core::validation::validate_quantity;
///
/// assert!(validate_quantity(1).is_ok());
/// assert!(validate_quantity(-1).is_err());
/// assert!(validate_quantity(1000).is_err());
/// ```
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_PURCHASE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_PURCHASE_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Payload Validators
// =============================================================================

/// Validates a registration payload.
pub fn validate_new_account(account: &NewAccount) -> ValidationResult<()> {
    validate_username(&account.username)?;
    validate_password(&account.username, &account.password)
}

/// Validates the fields present in an account patch.
pub fn validate_account_patch(patch: &AccountPatch) -> ValidationResult<()> {
    if let Some(username) = &patch.username {
        validate_username(username)?;
    }
    Ok(())
}

/// Validates a product creation payload.
///
/// Both cost and starting stock must be positive.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&product.name)?;
    validate_unit_cost(product.unit_cost)?;

    if product.amount_available <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount_available".to_string(),
        });
    }

    Ok(())
}

/// Validates the fields present in a product patch.
///
/// `Some(0)` stock is accepted. `Some(0)` cost and `Some("")` name are not.
pub fn validate_patch(patch: &ProductPatch) -> ValidationResult<()> {
    if let Some(name) = &patch.name {
        validate_product_name(name)?;
    }

    if let Some(unit_cost) = patch.unit_cost {
        validate_unit_cost(unit_cost)?;
    }

    if let Some(amount_available) = patch.amount_available {
        if amount_available < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "amount_available".to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(matches!(
            validate_username("   "),
            Err(ValidationError::Required { .. })
        ));
        assert!(validate_username(&"u".repeat(MAX_NAME_LENGTH)).is_ok());
        assert!(matches!(
            validate_username(&"u".repeat(MAX_NAME_LENGTH + 1)),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("alice", "s3cret").is_ok());
        assert!(validate_password("alice", "").is_err());
        assert!(matches!(
            validate_password("alice", "alice"),
            Err(ValidationError::MustDiffer { .. })
        ));
    }

    #[test]
    fn test_new_account() {
        let account = NewAccount {
            username: "alice".to_string(),
            password: "hunter22".to_string(),
            role: Role::Buyer,
        };
        assert!(validate_new_account(&account).is_ok());

        let account = NewAccount {
            username: String::new(),
            ..account
        };
        assert!(validate_new_account(&account).is_err());
    }

    #[test]
    fn test_account_patch_rules() {
        assert!(validate_account_patch(&AccountPatch::default()).is_ok());
        assert!(validate_account_patch(&AccountPatch {
            username: Some("alicia".to_string()),
        })
        .is_ok());
        assert!(matches!(
            validate_account_patch(&AccountPatch {
                username: Some("  ".to_string()),
            }),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_account_patch(&AccountPatch {
                username: Some("u".repeat(MAX_NAME_LENGTH + 1)),
            }),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_new_product() {
        let product = NewProduct {
            name: "Cola".to_string(),
            unit_cost: 65,
            amount_available: 10,
        };
        assert!(validate_new_product(&product).is_ok());

        let zero_cost = NewProduct {
            unit_cost: 0,
            ..product.clone()
        };
        assert!(validate_new_product(&zero_cost).is_err());

        let no_stock = NewProduct {
            amount_available: 0,
            ..product.clone()
        };
        assert!(validate_new_product(&no_stock).is_err());

        let no_name = NewProduct {
            name: " ".to_string(),
            ..product
        };
        assert!(validate_new_product(&no_name).is_err());
    }

    #[test]
    fn test_patch_rules() {
        assert!(validate_patch(&ProductPatch::default()).is_ok());
        assert!(validate_patch(&ProductPatch {
            amount_available: Some(0),
            ..Default::default()
        })
        .is_ok());

        assert!(validate_patch(&ProductPatch {
            unit_cost: Some(0),
            ..Default::default()
        })
        .is_err());
        assert!(validate_patch(&ProductPatch {
            name: Some(String::new()),
            ..Default::default()
        })
        .is_err());
        assert!(validate_patch(&ProductPatch {
            amount_available: Some(-1),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_PURCHASE_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(MAX_PURCHASE_QUANTITY + 1).is_err());
    }
}
