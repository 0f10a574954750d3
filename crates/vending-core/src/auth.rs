//! # Authorization Gate
//!
//! Pure role/ownership predicate consulted before every service operation.
//!
//! ```text
//! authorize(principal, required_roles, owner_id?)
//!      │
//!      ├── principal.role ∉ required_roles ──► Deny(RoleNotAllowed)
//!      │
//!      ├── owner_id given and ≠ principal.id ──► Deny(NotOwner)
//!      │
//!      └── otherwise ──────────────────────────► Allow
//! ```
//!
//! Denial is a value, not an error. Services turn it into
//! [`CoreError::Forbidden`] with [`Authorization::require`].

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{Principal, Role};

/// Roles allowed to buy and read their purchase history.
pub const BUYER_ONLY: &[Role] = &[Role::Buyer];

/// Roles allowed to manage products.
pub const SELLER_ONLY: &[Role] = &[Role::Seller];

/// Any authenticated caller.
pub const ANY_ROLE: &[Role] = &[Role::Buyer, Role::Seller];

/// Why the gate refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenyReason {
    RoleNotAllowed { role: Role, required: Vec<Role> },
    NotOwner,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::RoleNotAllowed { role, required } => {
                let required: Vec<&str> = required.iter().map(Role::as_str).collect();
                write!(f, "role {} is not one of [{}]", role, required.join(", "))
            }
            DenyReason::NotOwner => f.write_str("caller does not own this resource"),
        }
    }
}

/// Gate outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Allow,
    Deny(DenyReason),
}

impl Authorization {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Authorization::Allow)
    }

    /// Converts a denial into `CoreError::Forbidden`.
    pub fn require(self) -> CoreResult<()> {
        match self {
            Authorization::Allow => Ok(()),
            Authorization::Deny(reason) => Err(CoreError::Forbidden(reason)),
        }
    }
}

/// Checks role membership, then ownership when `owner_id` is given.
pub fn authorize(principal: &Principal, required_roles: &[Role], owner_id: Option<&str>) -> Authorization {
    if !required_roles.contains(&principal.role) {
        return Authorization::Deny(DenyReason::RoleNotAllowed {
            role: principal.role,
            required: required_roles.to_vec(),
        });
    }

    match owner_id {
        Some(owner) if owner != principal.id => Authorization::Deny(DenyReason::NotOwner),
        _ => Authorization::Allow,
    }
}
