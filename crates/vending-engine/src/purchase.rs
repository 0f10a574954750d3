//! # Purchase Engine
//!
//! The atomic buy: debit, stock decrement and sale record commit together or
//! not at all.
//!
//! ## Buy Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  buy(principal, product_id, quantity)                                   │
//! │                                                                         │
//! │  1. gate: buyer role                      ──► FORBIDDEN                 │
//! │  2. begin + lock_for_write                ──► STORE_UNAVAILABLE         │
//! │  3. load account, load product            ──► NOT_FOUND                 │
//! │  4. plan_purchase (funds, then stock)     ──► INSUFFICIENT_FUNDS        │
//! │                                               INSUFFICIENT_STOCK        │
//! │  ─────────────── nothing written above this line ───────────────────── │
//! │  5. decrement stock (guarded)             ┐                             │
//! │  6. debit balance (guarded)               ├─► PURCHASE_FAILED           │
//! │  7. insert sale record                    │   (unit of work dropped,    │
//! │  8. commit                                ┘    everything rolled back)  │
//! │  9. receipt: change = compute_change(balance after debit)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two buyers racing for the last unit serialize on the store's write lock;
//! the second one plans against the committed stock and gets
//! `INSUFFICIENT_STOCK`.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use vending_core::auth::BUYER_ONLY;
use vending_core::{
    authorize, compute_change, plan_purchase, CoreError, CoreResult, Principal, PurchaseHistory,
    PurchaseReceipt, PurchasedItem, SaleRecord,
};

use crate::catalog::{load_product, CatalogStore};
use crate::ledger::{load_account, AccountLedger};
use crate::new_id;
use crate::store::Store;

/// Buy service.
#[derive(Clone)]
pub struct PurchaseEngine {
    store: Arc<dyn Store>,
    ledger: AccountLedger,
    catalog: CatalogStore,
}

impl PurchaseEngine {
    pub fn new(store: Arc<dyn Store>, ledger: AccountLedger, catalog: CatalogStore) -> Self {
        PurchaseEngine {
            store,
            ledger,
            catalog,
        }
    }

    /// Buys `quantity` units of a product with the caller's balance.
    pub async fn buy(
        &self,
        principal: &Principal,
        product_id: &str,
        quantity: i64,
    ) -> CoreResult<PurchaseReceipt> {
        authorize(principal, BUYER_ONLY, None).require()?;
        debug!(buyer_id = %principal.id, product_id, quantity, "Purchase requested");

        let mut uow = self.store.begin().await?;
        uow.lock_for_write().await?;

        let mut account = load_account(uow.as_mut(), &principal.id).await?;
        let mut product = load_product(uow.as_mut(), product_id).await?;

        let plan = match plan_purchase(&account, &product, quantity) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(buyer_id = %account.id, product_id, quantity, error = %e, "Purchase rejected");
                return Err(e);
            }
        };

        self.catalog
            .decrement_stock(uow.as_mut(), &mut product, plan.quantity)
            .await
            .map_err(abort)?;
        self.ledger
            .debit(uow.as_mut(), &mut account, plan.cost)
            .await
            .map_err(abort)?;

        let sale = SaleRecord {
            id: new_id(),
            buyer_id: account.id.clone(),
            product_id: product.id.clone(),
            quantity: plan.quantity,
            created_at: Utc::now(),
        };
        uow.insert_sale(&sale)
            .await
            .map_err(|e| e.into_purchase_failure())?;
        uow.commit().await.map_err(|e| e.into_purchase_failure())?;

        info!(
            sale_id = %sale.id,
            buyer_id = %sale.buyer_id,
            product_id = %sale.product_id,
            quantity = sale.quantity,
            spent = plan.cost.cents(),
            "Purchase committed"
        );
        Ok(plan.receipt())
    }

    /// Everything the caller has bought, priced at current unit costs.
    pub async fn history(&self, principal: &Principal) -> CoreResult<PurchaseHistory> {
        authorize(principal, BUYER_ONLY, None).require()?;

        let mut uow = self.store.begin().await?;
        let account = load_account(uow.as_mut(), &principal.id).await?;
        let sales = uow.list_sales_for_account(&account.id).await?;

        let mut purchases = Vec::with_capacity(sales.len());
        for sale in sales {
            // Sales cascade with their product, so a miss means a concurrent delete.
            let Some(product) = uow.get_product(&sale.product_id).await? else {
                continue;
            };
            purchases.push(PurchasedItem {
                product_id: product.id,
                name: product.name,
                unit_cost: product.unit_cost,
                quantity: sale.quantity,
            });
        }

        let total_spent = purchases.iter().map(PurchasedItem::line_total).sum();
        Ok(PurchaseHistory {
            buyer_id: account.id,
            total_spent,
            change: compute_change(account.balance),
            purchases,
        })
    }
}

/// Any failure after the first write aborts the whole purchase.
fn abort(err: CoreError) -> CoreError {
    match err {
        CoreError::PurchaseFailed(_) => err,
        other => CoreError::PurchaseFailed(other.to_string()),
    }
}
