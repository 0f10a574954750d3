//! # Purchase Planning
//!
//! Decides whether a buy can go ahead before anything is written.
//!
//! ## Purchase State Machine
//! ```text
//!   Requested
//!       │  plan_purchase(account, product, quantity)
//!       ├──────────────► Rejected (InvalidPayload | InsufficientFunds | InsufficientStock)
//!       ▼
//!   Validated ── PurchasePlan { cost, balance_after, stock_after }
//!       │  store transaction: decrement stock, debit balance, append sale
//!       ├──────────────► Rejected (PurchaseFailed, fully rolled back)
//!       ▼
//!   Committed ── PurchaseReceipt
//! ```
//!
//! Funds are checked before stock.

use crate::change::compute_change;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Account, Product, PurchaseReceipt, PurchasedItem};
use crate::validation::validate_quantity;

/// A validated purchase, ready to be applied in one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchasePlan {
    pub buyer_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub cost: Money,
    pub balance_after: Money,
    pub stock_after: i64,
    pub item: PurchasedItem,
}

impl PurchasePlan {
    /// Receipt for this plan once its transaction has committed.
    pub fn receipt(&self) -> PurchaseReceipt {
        PurchaseReceipt {
            buyer_id: self.buyer_id.clone(),
            total_spent: self.cost.cents(),
            change: compute_change(self.balance_after.cents()),
            products_purchased: vec![self.item.clone()],
        }
    }
}

/// Validates quantity, funds and stock for `quantity` units of `product`.
pub fn plan_purchase(account: &Account, product: &Product, quantity: i64) -> CoreResult<PurchasePlan> {
    validate_quantity(quantity)?;

    let cost = Money::from_cents(product.unit_cost)
        .times(quantity)
        .ok_or_else(|| CoreError::InsufficientFunds {
            balance: account.balance,
            required: i64::MAX,
        })?;

    if account.balance < cost.cents() {
        return Err(CoreError::InsufficientFunds {
            balance: account.balance,
            required: cost.cents(),
        });
    }

    if product.amount_available < quantity {
        return Err(CoreError::InsufficientStock {
            product_id: product.id.clone(),
            available: product.amount_available,
            requested: quantity,
        });
    }

    Ok(PurchasePlan {
        buyer_id: account.id.clone(),
        product_id: product.id.clone(),
        quantity,
        cost,
        balance_after: Money::from_cents(account.balance) - cost,
        stock_after: product.amount_available - quantity,
        item: PurchasedItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_cost: product.unit_cost,
            quantity,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::CoinChange;
    use crate::error::ErrorKind;
    use crate::types::Role;
    use chrono::Utc;

    fn buyer(balance: i64) -> Account {
        let now = Utc::now();
        Account {
            id: "b-1".to_string(),
            username: "bob".to_string(),
            credential_hash: String::new(),
            role: Role::Buyer,
            balance,
            created_at: now,
            updated_at: now,
        }
    }

    fn chips(unit_cost: i64, amount_available: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            name: "Chips".to_string(),
            unit_cost,
            amount_available,
            seller_id: "s-1".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_plan_and_receipt() {
        let plan = plan_purchase(&buyer(380), &chips(65, 10), 3).unwrap();
        assert_eq!(plan.cost.cents(), 195);
        assert_eq!(plan.balance_after.cents(), 185);
        assert_eq!(plan.stock_after, 7);

        let receipt = plan.receipt();
        assert_eq!(receipt.buyer_id, "b-1");
        assert_eq!(receipt.total_spent, 195);
        assert_eq!(
            receipt.change,
            CoinChange {
                hundreds: 1,
                fifties: 1,
                twenties: 1,
                tens: 1,
                fives: 1,
            }
        );
        assert_eq!(receipt.products_purchased.len(), 1);
        assert_eq!(receipt.products_purchased[0].line_total(), 195);
    }

    #[test]
    fn test_exact_balance_is_enough() {
        let plan = plan_purchase(&buyer(130), &chips(65, 2), 2).unwrap();
        assert!(plan.balance_after.is_zero());
        assert_eq!(plan.receipt().change, CoinChange::default());
    }

    #[test]
    fn test_funds_checked_before_stock() {
        let err = plan_purchase(&buyer(50), &chips(65, 0), 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

        let err = plan_purchase(&buyer(500), &chips(65, 1), 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
    }

    #[test]
    fn test_quantity_must_be_positive() {
        for quantity in [0, -1] {
            let err = plan_purchase(&buyer(500), &chips(65, 5), quantity).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidPayload);
        }
    }
}
