//! # Catalog Store
//!
//! Product existence, ownership and stock.
//!
//! ## Update Flow
//! ```text
//! update(principal, product_id, patch)
//!      │
//!      ├── gate: seller role ─────────────────► FORBIDDEN
//!      ├── lock + load product ───────────────► NOT_FOUND
//!      ├── gate: principal owns product ──────► FORBIDDEN
//!      ├── validate present patch fields ─────► INVALID_PAYLOAD
//!      ├── merge + write (name unique) ───────► DUPLICATE_NAME
//!      └── commit ─────────────────────────────► Product
//! ```
//!
//! Ownership is checked before the payload, so a non-owner is refused the
//! same way whatever it sends.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use vending_core::auth::{ANY_ROLE, SELLER_ONLY};
use vending_core::validation::{validate_new_product, validate_patch};
use vending_core::{authorize, CoreError, CoreResult, NewProduct, Principal, Product, ProductPatch};

use crate::error::StoreError;
use crate::new_id;
use crate::store::{Store, UnitOfWork};

/// Product service.
#[derive(Clone)]
pub struct CatalogStore {
    store: Arc<dyn Store>,
}

impl CatalogStore {
    pub fn new(store: Arc<dyn Store>) -> Self {
        CatalogStore { store }
    }

    /// Adds a product owned by the calling seller.
    pub async fn create(&self, principal: &Principal, new_product: NewProduct) -> CoreResult<Product> {
        authorize(principal, SELLER_ONLY, None).require()?;
        validate_new_product(&new_product)?;

        let now = Utc::now();
        let product = Product {
            id: new_id(),
            name: new_product.name.trim().to_string(),
            unit_cost: new_product.unit_cost,
            amount_available: new_product.amount_available,
            seller_id: principal.id.clone(),
            created_at: now,
            updated_at: now,
        };

        let mut uow = self.store.begin().await?;
        uow.lock_for_write().await?;
        uow.insert_product(&product)
            .await
            .map_err(|e| product_write_error(e, &product))?;
        uow.commit().await?;

        info!(product_id = %product.id, seller_id = %product.seller_id, "Product created");
        Ok(product)
    }

    /// Merges `patch` into a product the caller owns.
    pub async fn update(
        &self,
        principal: &Principal,
        product_id: &str,
        patch: ProductPatch,
    ) -> CoreResult<Product> {
        authorize(principal, SELLER_ONLY, None).require()?;

        let mut uow = self.store.begin().await?;
        uow.lock_for_write().await?;

        let mut product = load_product(uow.as_mut(), product_id).await?;
        if let Err(e) = authorize(principal, SELLER_ONLY, Some(product.seller_id.as_str())).require() {
            warn!(product_id, caller = %principal.id, "Update by non-owner refused");
            return Err(e);
        }
        validate_patch(&patch)?;

        if patch.is_empty() {
            debug!(product_id, "Empty patch, nothing to write");
            return Ok(product);
        }

        product.apply_patch(&patch);
        product.updated_at = Utc::now();

        if !uow
            .update_product(&product)
            .await
            .map_err(|e| product_write_error(e, &product))?
        {
            return Err(CoreError::not_found("Product", product_id));
        }
        uow.commit().await?;

        info!(product_id, "Product updated");
        Ok(product)
    }

    /// Removes a product the caller owns. A second call fails `NotFound`.
    pub async fn delete(&self, principal: &Principal, product_id: &str) -> CoreResult<()> {
        authorize(principal, SELLER_ONLY, None).require()?;

        let mut uow = self.store.begin().await?;
        uow.lock_for_write().await?;

        let product = load_product(uow.as_mut(), product_id).await?;
        if let Err(e) = authorize(principal, SELLER_ONLY, Some(product.seller_id.as_str())).require() {
            warn!(product_id, caller = %principal.id, "Delete by non-owner refused");
            return Err(e);
        }

        if !uow.delete_product(product_id).await? {
            return Err(CoreError::not_found("Product", product_id));
        }
        uow.commit().await?;

        info!(product_id, "Product deleted");
        Ok(())
    }

    pub async fn get_product(&self, principal: &Principal, product_id: &str) -> CoreResult<Product> {
        authorize(principal, ANY_ROLE, None).require()?;
        let mut uow = self.store.begin().await?;
        load_product(uow.as_mut(), product_id).await
    }

    /// All products, ordered by name.
    pub async fn list_products(&self, principal: &Principal) -> CoreResult<Vec<Product>> {
        authorize(principal, ANY_ROLE, None).require()?;
        let mut uow = self.store.begin().await?;
        Ok(uow.list_products().await?)
    }

    /// Takes stock out inside the caller's unit of work.
    pub async fn decrement_stock(
        &self,
        uow: &mut dyn UnitOfWork,
        product: &mut Product,
        quantity: i64,
    ) -> CoreResult<()> {
        product.decrement_stock(quantity)?;

        if !uow.decrement_stock(&product.id, quantity).await? {
            let current = load_product(uow, &product.id).await?;
            return Err(CoreError::InsufficientStock {
                product_id: current.id,
                available: current.amount_available,
                requested: quantity,
            });
        }

        debug!(product_id = %product.id, quantity, "Stock decremented");
        Ok(())
    }
}

pub(crate) async fn load_product(uow: &mut dyn UnitOfWork, id: &str) -> CoreResult<Product> {
    uow.get_product(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Product", id))
}

fn product_write_error(err: StoreError, product: &Product) -> CoreError {
    match err {
        StoreError::UniqueViolation(_) => CoreError::duplicate("Product", &product.name),
        StoreError::ForeignKeyViolation(_) => CoreError::not_found("Account", &product.seller_id),
        other => other.into(),
    }
}
