use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockroom_auth::{Account, AccountStore, AccountStoreError};
use stockroom_core::{AccountId, ProductId};
use stockroom_products::{Product, ProductFilter, ProductPatch, ProductStore, ProductStoreError};

/// In-memory account store keyed by email.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    by_email: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn account_lock_poisoned() -> AccountStoreError {
    AccountStoreError::Unavailable("lock poisoned".to_string())
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountStoreError> {
        let map = self.by_email.read().map_err(|_| account_lock_poisoned())?;
        Ok(map.get(email).cloned())
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountStoreError> {
        let map = self.by_email.read().map_err(|_| account_lock_poisoned())?;
        Ok(map.values().find(|a| a.id == id).cloned())
    }

    async fn insert(&self, account: Account) -> Result<(), AccountStoreError> {
        let mut map = self.by_email.write().map_err(|_| account_lock_poisoned())?;
        if map.contains_key(&account.email) {
            return Err(AccountStoreError::DuplicateEmail);
        }
        map.insert(account.email.clone(), account);
        Ok(())
    }

    async fn ping(&self) -> Result<(), AccountStoreError> {
        self.by_email.read().map(|_| ()).map_err(|_| account_lock_poisoned())
    }
}

/// In-memory product store.
///
/// Intended for tests/dev. Lists are a full scan.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    rows: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn product_lock_poisoned() -> ProductStoreError {
    ProductStoreError::Unavailable("lock poisoned".to_string())
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn get(&self, id: ProductId) -> Result<Option<Product>, ProductStoreError> {
        let rows = self.rows.read().map_err(|_| product_lock_poisoned())?;
        Ok(rows.get(&id).cloned())
    }

    async fn insert(&self, product: Product) -> Result<(), ProductStoreError> {
        let mut rows = self.rows.write().map_err(|_| product_lock_poisoned())?;
        rows.insert(product.id, product);
        Ok(())
    }

    async fn update(
        &self,
        id: ProductId,
        patch: &ProductPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Product>, ProductStoreError> {
        let mut rows = self.rows.write().map_err(|_| product_lock_poisoned())?;
        Ok(rows.get_mut(&id).map(|product| {
            product.apply_patch(patch, now);
            product.clone()
        }))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, ProductStoreError> {
        let mut rows = self.rows.write().map_err(|_| product_lock_poisoned())?;
        Ok(rows.remove(&id).is_some())
    }

    async fn list(
        &self,
        owner: AccountId,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, ProductStoreError> {
        let rows = self.rows.read().map_err(|_| product_lock_poisoned())?;
        let mut products: Vec<Product> = rows
            .values()
            .filter(|p| p.user_created == owner && filter.matches(p))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use stockroom_products::NewProduct;

    use super::*;

    fn account(email: &str) -> Account {
        Account {
            id: AccountId::new(),
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            created_at: Utc::now(),
        }
    }

    fn product(owner: AccountId, name: &str, price: f64, created_at: DateTime<Utc>) -> Product {
        let draft = NewProduct {
            name: Some(name.into()),
            description: None,
            price: Some(price),
        }
        .validate()
        .unwrap();
        Product::new(draft, owner, created_at)
    }

    #[tokio::test]
    async fn accounts_are_unique_by_email() {
        let store = InMemoryAccountStore::new();
        let alice = account("alice@example.com");
        store.insert(alice.clone()).await.unwrap();

        assert_eq!(
            store.insert(account("alice@example.com")).await,
            Err(AccountStoreError::DuplicateEmail)
        );
        assert_eq!(store.find_by_email("alice@example.com").await.unwrap(), Some(alice.clone()));
        assert_eq!(store.find_by_id(alice.id).await.unwrap(), Some(alice));
        assert_eq!(store.find_by_email("ALICE@example.com").await.unwrap(), None);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn list_is_owner_scoped_and_ordered_by_creation() {
        let store = InMemoryProductStore::new();
        let (alice, bob) = (AccountId::new(), AccountId::new());
        let t0 = Utc::now();

        let second = product(alice, "second", 2.0, t0 + Duration::seconds(1));
        let first = product(alice, "first", 1.0, t0);
        store.insert(second.clone()).await.unwrap();
        store.insert(first.clone()).await.unwrap();
        store.insert(product(bob, "other", 3.0, t0)).await.unwrap();

        let listed = store.list(alice, &ProductFilter::default()).await.unwrap();
        assert_eq!(listed, vec![first, second]);
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_rows() {
        let store = InMemoryProductStore::new();
        let patch = ProductPatch::default();
        assert_eq!(store.update(ProductId::new(), &patch, Utc::now()).await.unwrap(), None);
        assert!(!store.delete(ProductId::new()).await.unwrap());
    }

    #[tokio::test]
    async fn default_stats_aggregate_the_filtered_list() {
        let store = InMemoryProductStore::new();
        let alice = AccountId::new();
        let t0 = Utc::now();
        store.insert(product(alice, "cheap", 5.0, t0)).await.unwrap();
        store.insert(product(alice, "pricey", 500.0, t0)).await.unwrap();

        let filter = ProductFilter {
            max_price: Some(100.0),
            ..ProductFilter::default()
        };
        let stats = store.stats(alice, &filter).await.unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.total_price, 5.0);

        let empty = store.stats(AccountId::new(), &ProductFilter::default()).await.unwrap();
        assert_eq!(empty.count, 0);
        assert_eq!(empty.average_price, None);
    }
}
