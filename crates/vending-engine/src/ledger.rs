//! # Account Ledger
//!
//! Accounts and every balance mutation.
//!
//! ## Operations
//! ```text
//! ┌──────────────────┬──────────────┬───────────────────────────────────────┐
//! │ Operation        │ Caller       │ Failure kinds                         │
//! ├──────────────────┼──────────────┼───────────────────────────────────────┤
//! │ register         │ anonymous    │ INVALID_PAYLOAD, DUPLICATE_NAME       │
//! │ authenticate     │ anonymous    │ INVALID_CREDENTIALS                   │
//! │ get / list       │ any role     │ NOT_FOUND                             │
//! │ update_account   │ own account  │ INVALID_PAYLOAD, DUPLICATE_NAME       │
//! │ deposit          │ own account  │ INVALID_AMOUNT, ROLE_NOT_PERMITTED    │
//! │ reset            │ own buyer    │ FORBIDDEN, NOT_FOUND                  │
//! │ delete_account   │ own account  │ NOT_FOUND                             │
//! │ debit            │ PurchaseEng. │ INSUFFICIENT_FUNDS, NOT_FOUND         │
//! └──────────────────┴──────────────┴───────────────────────────────────────┘
//! ```
//!
//! Deposit and reset read and write the balance inside one unit of work that
//! holds the store's write lock, so concurrent deposits and purchases on the
//! same account never lose an update.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use vending_core::auth::{ANY_ROLE, BUYER_ONLY};
use vending_core::validation::{validate_account_patch, validate_new_account};
use vending_core::{
    authorize, Account, AccountDetails, AccountPatch, AcceptedDenominations, BalanceView,
    CoreError, CoreResult, Money, NewAccount, Principal,
};

use crate::credentials::{hash_password, verify_password};
use crate::new_id;
use crate::store::{Store, UnitOfWork};

/// Account and balance service.
#[derive(Clone)]
pub struct AccountLedger {
    store: Arc<dyn Store>,
    accepted: AcceptedDenominations,
}

impl AccountLedger {
    pub fn new(store: Arc<dyn Store>, accepted: AcceptedDenominations) -> Self {
        AccountLedger { store, accepted }
    }

    /// Coins this ledger accepts.
    pub fn accepted_denominations(&self) -> &AcceptedDenominations {
        &self.accepted
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Creates an account with a zero balance.
    pub async fn register(&self, new_account: NewAccount) -> CoreResult<AccountDetails> {
        validate_new_account(&new_account)?;

        let credential_hash = hash_password(&new_account.password)
            .map_err(|e| CoreError::StoreUnavailable(e.to_string()))?;

        let now = Utc::now();
        let account = Account {
            id: new_id(),
            username: new_account.username.trim().to_string(),
            credential_hash,
            role: new_account.role,
            balance: 0,
            created_at: now,
            updated_at: now,
        };

        let mut uow = self.store.begin().await?;
        uow.lock_for_write().await?;
        uow.insert_account(&account).await.map_err(|e| {
            if e.is_unique_violation() {
                CoreError::duplicate("Account", &account.username)
            } else {
                e.into()
            }
        })?;
        uow.commit().await?;

        info!(account_id = %account.id, role = %account.role, "Account registered");
        Ok(account.details())
    }

    /// Checks a username/password pair.
    ///
    /// Unknown usernames and wrong passwords fail identically.
    pub async fn authenticate(&self, username: &str, password: &str) -> CoreResult<Principal> {
        let mut uow = self.store.begin().await?;
        let account = uow.get_account_by_username(username.trim()).await?;
        drop(uow);

        match account {
            Some(account) if verify_password(password, &account.credential_hash) => {
                debug!(account_id = %account.id, "Authenticated");
                Ok(account.principal())
            }
            _ => {
                warn!("Rejected login attempt");
                Err(CoreError::InvalidCredentials)
            }
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_account(&self, principal: &Principal, id: &str) -> CoreResult<AccountDetails> {
        authorize(principal, ANY_ROLE, None).require()?;
        let mut uow = self.store.begin().await?;
        uow.get_account(id)
            .await?
            .map(|a| a.details())
            .ok_or_else(|| CoreError::not_found("Account", id))
    }

    pub async fn list_accounts(&self, principal: &Principal) -> CoreResult<Vec<AccountDetails>> {
        authorize(principal, ANY_ROLE, None).require()?;
        let mut uow = self.store.begin().await?;
        let accounts = uow.list_accounts().await?;
        Ok(accounts.iter().map(Account::details).collect())
    }

    /// Renames the caller's own account.
    ///
    /// An empty patch returns the account unchanged.
    pub async fn update_account(
        &self,
        principal: &Principal,
        patch: AccountPatch,
    ) -> CoreResult<AccountDetails> {
        validate_account_patch(&patch)?;

        let mut uow = self.store.begin().await?;
        uow.lock_for_write().await?;

        let mut account = load_account(uow.as_mut(), &principal.id).await?;
        if patch.is_empty() {
            return Ok(account.details());
        }

        account.apply_patch(&patch);
        account.updated_at = Utc::now();

        let written = uow.update_account(&account).await.map_err(|e| {
            if e.is_unique_violation() {
                CoreError::duplicate("Account", &account.username)
            } else {
                e.into()
            }
        })?;
        if !written {
            return Err(CoreError::not_found("Account", &principal.id));
        }
        uow.commit().await?;

        info!(account_id = %account.id, "Account updated");
        Ok(account.details())
    }

    // =========================================================================
    // Balance Mutations
    // =========================================================================

    /// Adds one accepted coin to the caller's balance.
    pub async fn deposit(&self, principal: &Principal, amount: i64) -> CoreResult<BalanceView> {
        let mut uow = self.store.begin().await?;
        uow.lock_for_write().await?;

        let mut account = load_account(uow.as_mut(), &principal.id).await?;
        let balance = match account.deposit(amount, &self.accepted) {
            Ok(balance) => balance,
            Err(e) => {
                warn!(account_id = %account.id, amount, error = %e, "Deposit rejected");
                return Err(e);
            }
        };

        write_balance(uow.as_mut(), &account.id, balance).await?;
        uow.commit().await?;

        info!(account_id = %account.id, amount, balance = balance.cents(), "Deposit committed");
        Ok(BalanceView {
            balance: balance.cents(),
        })
    }

    /// Zeroes the caller's balance. Idempotent.
    pub async fn reset(&self, principal: &Principal) -> CoreResult<BalanceView> {
        authorize(principal, BUYER_ONLY, None).require()?;

        let mut uow = self.store.begin().await?;
        uow.lock_for_write().await?;

        let mut account = load_account(uow.as_mut(), &principal.id).await?;
        let balance = account.reset();

        write_balance(uow.as_mut(), &account.id, balance).await?;
        uow.commit().await?;

        info!(account_id = %account.id, "Balance reset");
        Ok(BalanceView {
            balance: balance.cents(),
        })
    }

    /// Debits `amount` inside the caller's unit of work.
    ///
    /// The store's guarded write re-checks the balance, so the debit cannot
    /// drive it negative even if `account` was read earlier.
    pub async fn debit(
        &self,
        uow: &mut dyn UnitOfWork,
        account: &mut Account,
        amount: Money,
    ) -> CoreResult<Money> {
        let balance = account.debit(amount)?;

        if !uow.debit_balance(&account.id, amount.cents()).await? {
            let current = load_account(uow, &account.id).await?;
            return Err(CoreError::InsufficientFunds {
                balance: current.balance,
                required: amount.cents(),
            });
        }

        debug!(account_id = %account.id, amount = amount.cents(), "Balance debited");
        Ok(balance)
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Deletes the caller's own account with its products and sale records.
    pub async fn delete_account(&self, principal: &Principal) -> CoreResult<()> {
        let mut uow = self.store.begin().await?;
        uow.lock_for_write().await?;

        if !uow.delete_account(&principal.id).await? {
            return Err(CoreError::not_found("Account", &principal.id));
        }
        uow.commit().await?;

        info!(account_id = %principal.id, "Account deleted");
        Ok(())
    }
}

pub(crate) async fn load_account(uow: &mut dyn UnitOfWork, id: &str) -> CoreResult<Account> {
    uow.get_account(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Account", id))
}

async fn write_balance(uow: &mut dyn UnitOfWork, id: &str, balance: Money) -> CoreResult<()> {
    if !uow.update_balance(id, balance.cents()).await? {
        return Err(CoreError::not_found("Account", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use vending_core::{ErrorKind, Role};

    fn ledger() -> AccountLedger {
        AccountLedger::new(Arc::new(MemoryStore::new()), AcceptedDenominations::default())
    }

    async fn register(ledger: &AccountLedger, username: &str, role: Role) -> Principal {
        let details = ledger
            .register(NewAccount {
                username: username.to_string(),
                password: format!("{}-pw", username),
                role,
            })
            .await
            .unwrap();
        Principal::new(details.id, details.role)
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let ledger = ledger();
        let buyer = register(&ledger, "bob", Role::Buyer).await;

        let principal = ledger.authenticate("bob", "bob-pw").await.unwrap();
        assert_eq!(principal, buyer);

        let details = ledger.get_account(&buyer, &buyer.id).await.unwrap();
        assert_eq!(details.balance, 0);
        assert_eq!(details.role, Role::Buyer);
    }

    #[tokio::test]
    async fn test_register_rejects_bad_payloads() {
        let ledger = ledger();
        register(&ledger, "bob", Role::Buyer).await;

        let err = ledger
            .register(NewAccount {
                username: "bob".to_string(),
                password: "other".to_string(),
                role: Role::Seller,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateName);

        let err = ledger
            .register(NewAccount {
                username: "carol".to_string(),
                password: "carol".to_string(),
                role: Role::Buyer,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPayload);
    }

    #[tokio::test]
    async fn test_authenticate_failures_look_identical() {
        let ledger = ledger();
        register(&ledger, "bob", Role::Buyer).await;

        let wrong_password = ledger.authenticate("bob", "nope").await.unwrap_err();
        let unknown_user = ledger.authenticate("nobody", "nope").await.unwrap_err();

        assert_eq!(wrong_password.kind(), ErrorKind::InvalidCredentials);
        assert_eq!(unknown_user.kind(), ErrorKind::InvalidCredentials);
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_deposit_accumulates() {
        let ledger = ledger();
        let buyer = register(&ledger, "bob", Role::Buyer).await;

        assert_eq!(ledger.deposit(&buyer, 100).await.unwrap().balance, 100);
        assert_eq!(ledger.deposit(&buyer, 5).await.unwrap().balance, 105);
        assert_eq!(ledger.get_account(&buyer, &buyer.id).await.unwrap().balance, 105);
    }

    #[tokio::test]
    async fn test_deposit_rejections_leave_balance() {
        let ledger = ledger();
        let buyer = register(&ledger, "bob", Role::Buyer).await;
        let seller = register(&ledger, "sam", Role::Seller).await;
        ledger.deposit(&buyer, 20).await.unwrap();

        for amount in [0, 1, 15, 25, 200, -5] {
            let err = ledger.deposit(&buyer, amount).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidAmount);
        }
        assert_eq!(ledger.get_account(&buyer, &buyer.id).await.unwrap().balance, 20);

        let err = ledger.deposit(&seller, 50).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RoleNotPermitted);
        assert_eq!(ledger.get_account(&seller, &seller.id).await.unwrap().balance, 0);
    }

    #[tokio::test]
    async fn test_configured_denominations() {
        let ledger = AccountLedger::new(
            Arc::new(MemoryStore::new()),
            AcceptedDenominations::new([25]).unwrap(),
        );
        let buyer = register(&ledger, "bob", Role::Buyer).await;

        assert_eq!(ledger.deposit(&buyer, 25).await.unwrap().balance, 25);
        let err = ledger.deposit(&buyer, 5).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAmount);
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let ledger = ledger();
        let buyer = register(&ledger, "bob", Role::Buyer).await;
        ledger.deposit(&buyer, 50).await.unwrap();

        assert_eq!(ledger.reset(&buyer).await.unwrap().balance, 0);
        assert_eq!(ledger.reset(&buyer).await.unwrap().balance, 0);
        assert_eq!(ledger.get_account(&buyer, &buyer.id).await.unwrap().balance, 0);
    }

    #[tokio::test]
    async fn test_reset_is_buyer_only() {
        let ledger = ledger();
        let seller = register(&ledger, "sam", Role::Seller).await;

        let err = ledger.reset(&seller).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(ledger.get_account(&seller, &seller.id).await.unwrap().balance, 0);
    }

    #[tokio::test]
    async fn test_update_account_renames() {
        let ledger = ledger();
        let buyer = register(&ledger, "bob", Role::Buyer).await;
        ledger.deposit(&buyer, 50).await.unwrap();

        let details = ledger
            .update_account(
                &buyer,
                AccountPatch {
                    username: Some("robert".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(details.username, "robert");
        assert_eq!(details.balance, 50);
        assert_eq!(details.role, Role::Buyer);

        let principal = ledger.authenticate("robert", "bob-pw").await.unwrap();
        assert_eq!(principal, buyer);
        let err = ledger.authenticate("bob", "bob-pw").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCredentials);

        let unchanged = ledger
            .update_account(&buyer, AccountPatch::default())
            .await
            .unwrap();
        assert_eq!(unchanged, details);
    }

    #[tokio::test]
    async fn test_update_account_rejections() {
        let ledger = ledger();
        let bob = register(&ledger, "bob", Role::Buyer).await;
        register(&ledger, "amy", Role::Seller).await;

        let err = ledger
            .update_account(
                &bob,
                AccountPatch {
                    username: Some("amy".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateName);

        let err = ledger
            .update_account(
                &bob,
                AccountPatch {
                    username: Some(String::new()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPayload);

        assert_eq!(ledger.get_account(&bob, &bob.id).await.unwrap().username, "bob");

        let ghost = Principal::new("missing", Role::Buyer);
        let err = ledger
            .update_account(
                &ghost,
                AccountPatch {
                    username: Some("ghost".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deposits_are_not_lost() {
        let ledger = ledger();
        let buyer = register(&ledger, "bob", Role::Buyer).await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let ledger = ledger.clone();
            let buyer = buyer.clone();
            handles.push(tokio::spawn(async move {
                ledger.deposit(&buyer, 10).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(ledger.get_account(&buyer, &buyer.id).await.unwrap().balance, 200);
    }

    #[tokio::test]
    async fn test_list_hides_credentials_and_delete() {
        let ledger = ledger();
        let bob = register(&ledger, "bob", Role::Buyer).await;

        let amy = register(&ledger, "amy", Role::Seller).await;
        let accounts = ledger.list_accounts(&amy).await.unwrap();
        let names: Vec<&str> = accounts.iter().map(|a| a.username.as_str()).collect();
        assert_eq!(names, vec!["amy", "bob"]);

        ledger.delete_account(&bob).await.unwrap();
        let err = ledger.get_account(&amy, &bob.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = ledger.delete_account(&bob).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
