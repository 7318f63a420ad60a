//! Per-caller product operations.
//!
//! The caller identity is resolved upstream and passed in explicitly; every
//! by-id operation then goes through [`OwnershipGuard`] before touching the
//! store.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use stockroom_auth::{OwnershipError, OwnershipGuard};
use stockroom_core::{AccountId, ProductId, ValidationErrors};

use crate::product::{NewProduct, Product, ProductPatch};
use crate::query::{ProductFilter, ProductStats};
use crate::store::{ProductStore, ProductStoreError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("product not found")]
    NotFound,

    #[error("access to this product is forbidden")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] ProductStoreError),
}

impl From<OwnershipError<ProductStoreError>> for CatalogError {
    fn from(value: OwnershipError<ProductStoreError>) -> Self {
        match value {
            OwnershipError::NotFound => Self::NotFound,
            OwnershipError::Forbidden(_) => Self::Forbidden,
            OwnershipError::Store(e) => Self::Store(e),
        }
    }
}

#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn ProductStore>,
    guard: OwnershipGuard<Arc<dyn ProductStore>>,
}

impl Catalog {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self {
            guard: OwnershipGuard::new(store.clone()),
            store,
        }
    }

    pub async fn list(
        &self,
        caller: AccountId,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, CatalogError> {
        Ok(self.store.list(caller, filter).await?)
    }

    pub async fn stats(
        &self,
        caller: AccountId,
        filter: &ProductFilter,
    ) -> Result<ProductStats, CatalogError> {
        Ok(self.store.stats(caller, filter).await?)
    }

    pub async fn create(&self, caller: AccountId, input: NewProduct) -> Result<Product, CatalogError> {
        let draft = input.validate()?;
        let product = Product::new(draft, caller, Utc::now());
        self.store.insert(product.clone()).await?;
        tracing::info!(product_id = %product.id, owner = %caller, "product created");
        Ok(product)
    }

    pub async fn get(&self, caller: AccountId, id: ProductId) -> Result<Product, CatalogError> {
        Ok(self.guard.authorize(&id, caller).await?)
    }

    /// Partial update; last write wins between concurrent updates.
    pub async fn update(
        &self,
        caller: AccountId,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, CatalogError> {
        self.guard.authorize(&id, caller).await?;
        patch.validate()?;
        self.store
            .update(id, &patch, Utc::now())
            .await?
            .ok_or(CatalogError::NotFound)
    }

    pub async fn delete(&self, caller: AccountId, id: ProductId) -> Result<(), CatalogError> {
        self.guard.authorize(&id, caller).await?;
        if !self.store.delete(id).await? {
            return Err(CatalogError::NotFound);
        }
        tracing::info!(product_id = %id, owner = %caller, "product deleted");
        Ok(())
    }
}
