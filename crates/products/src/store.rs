use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use stockroom_auth::ResourceLookup;
use stockroom_core::{AccountId, ProductId};

use crate::product::{Product, ProductPatch};
use crate::query::{ProductFilter, ProductStats};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProductStoreError {
    #[error("product store unavailable: {0}")]
    Unavailable(String),
}

/// Storage port for products.
///
/// Implementations do no authorization; callers go through
/// [`crate::Catalog`], which checks ownership first.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn get(&self, id: ProductId) -> Result<Option<Product>, ProductStoreError>;

    async fn insert(&self, product: Product) -> Result<(), ProductStoreError>;

    /// Apply `patch` and return the stored result; `None` if `id` is gone.
    async fn update(
        &self,
        id: ProductId,
        patch: &ProductPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Product>, ProductStoreError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: ProductId) -> Result<bool, ProductStoreError>;

    /// Products owned by `owner` that match `filter`, oldest first.
    async fn list(
        &self,
        owner: AccountId,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, ProductStoreError>;

    async fn stats(
        &self,
        owner: AccountId,
        filter: &ProductFilter,
    ) -> Result<ProductStats, ProductStoreError> {
        let products = self.list(owner, filter).await?;
        Ok(ProductStats::from_products(&products))
    }
}

#[async_trait]
impl<'a> ResourceLookup for dyn ProductStore + 'a {
    type Id = ProductId;
    type Resource = Product;
    type Error = ProductStoreError;

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, ProductStoreError> {
        self.get(*id).await
    }
}
