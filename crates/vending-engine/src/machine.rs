//! Process-level wiring of the three services.
//!
//! Built once at startup and handed to the transport layer; cloning is cheap
//! (every field shares the same `Arc<dyn Store>`).

use std::sync::Arc;

use vending_core::{
    AccountDetails, AccountPatch, BalanceView, CoreResult, NewAccount, NewProduct, Principal, Product,
    ProductPatch, PurchaseHistory, PurchaseReceipt,
};

use crate::catalog::CatalogStore;
use crate::config::VendingConfig;
use crate::ledger::AccountLedger;
use crate::purchase::PurchaseEngine;
use crate::store::Store;

/// The vending machine's operation surface.
#[derive(Clone)]
pub struct VendingMachine {
    ledger: AccountLedger,
    catalog: CatalogStore,
    purchases: PurchaseEngine,
}

impl VendingMachine {
    pub fn new(store: Arc<dyn Store>, config: &VendingConfig) -> Self {
        let ledger = AccountLedger::new(store.clone(), config.accepted_denominations.clone());
        let catalog = CatalogStore::new(store.clone());
        let purchases = PurchaseEngine::new(store, ledger.clone(), catalog.clone());

        VendingMachine {
            ledger,
            catalog,
            purchases,
        }
    }

    pub fn ledger(&self) -> &AccountLedger {
        &self.ledger
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn purchases(&self) -> &PurchaseEngine {
        &self.purchases
    }

    // =========================================================================
    // Operation Surface
    // =========================================================================

    pub async fn register(&self, new_account: NewAccount) -> CoreResult<AccountDetails> {
        self.ledger.register(new_account).await
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> CoreResult<Principal> {
        self.ledger.authenticate(username, password).await
    }

    pub async fn get_account(
        &self,
        principal: &Principal,
        account_id: &str,
    ) -> CoreResult<AccountDetails> {
        self.ledger.get_account(principal, account_id).await
    }

    pub async fn list_accounts(&self, principal: &Principal) -> CoreResult<Vec<AccountDetails>> {
        self.ledger.list_accounts(principal).await
    }

    pub async fn update_account(
        &self,
        principal: &Principal,
        patch: AccountPatch,
    ) -> CoreResult<AccountDetails> {
        self.ledger.update_account(principal, patch).await
    }

    pub async fn delete_account(&self, principal: &Principal) -> CoreResult<()> {
        self.ledger.delete_account(principal).await
    }

    pub async fn deposit(&self, principal: &Principal, amount: i64) -> CoreResult<BalanceView> {
        self.ledger.deposit(principal, amount).await
    }

    pub async fn reset_deposit(&self, principal: &Principal) -> CoreResult<BalanceView> {
        self.ledger.reset(principal).await
    }

    pub async fn get_product(&self, principal: &Principal, product_id: &str) -> CoreResult<Product> {
        self.catalog.get_product(principal, product_id).await
    }

    pub async fn list_products(&self, principal: &Principal) -> CoreResult<Vec<Product>> {
        self.catalog.list_products(principal).await
    }

    pub async fn create_product(&self, principal: &Principal, product: NewProduct) -> CoreResult<Product> {
        self.catalog.create(principal, product).await
    }

    pub async fn update_product(
        &self,
        principal: &Principal,
        product_id: &str,
        patch: ProductPatch,
    ) -> CoreResult<Product> {
        self.catalog.update(principal, product_id, patch).await
    }

    pub async fn delete_product(&self, principal: &Principal, product_id: &str) -> CoreResult<()> {
        self.catalog.delete(principal, product_id).await
    }

    pub async fn buy(
        &self,
        principal: &Principal,
        product_id: &str,
        quantity: i64,
    ) -> CoreResult<PurchaseReceipt> {
        self.purchases.buy(principal, product_id, quantity).await
    }

    pub async fn purchase_history(&self, principal: &Principal) -> CoreResult<PurchaseHistory> {
        self.purchases.history(principal).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use vending_core::{ErrorKind, Role};

    #[tokio::test]
    async fn test_end_to_end_session() {
        let config = VendingConfig::default();
        let machine = VendingMachine::new(Arc::new(MemoryStore::new()), &config);

        machine
            .register(NewAccount {
                username: "sam".to_string(),
                password: "sam-pw".to_string(),
                role: Role::Seller,
            })
            .await
            .unwrap();
        machine
            .register(NewAccount {
                username: "bob".to_string(),
                password: "bob-pw".to_string(),
                role: Role::Buyer,
            })
            .await
            .unwrap();

        let seller = machine.authenticate("sam", "sam-pw").await.unwrap();
        let buyer = machine.authenticate("bob", "bob-pw").await.unwrap();

        let gum = machine
            .create_product(
                &seller,
                NewProduct {
                    name: "Gum".to_string(),
                    unit_cost: 15,
                    amount_available: 4,
                },
            )
            .await
            .unwrap();

        machine.deposit(&buyer, 50).await.unwrap();
        let receipt = machine.buy(&buyer, &gum.id, 2).await.unwrap();
        assert_eq!(receipt.total_spent, 30);
        assert_eq!(receipt.change.twenties, 1);

        assert_eq!(machine.reset_deposit(&buyer).await.unwrap().balance, 0);
        let err = machine.buy(&buyer, &gum.id, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

        let history = machine.purchase_history(&buyer).await.unwrap();
        assert_eq!(history.total_spent, 30);

        machine.delete_product(&seller, &gum.id).await.unwrap();
        let err = machine.delete_product(&seller, &gum.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
