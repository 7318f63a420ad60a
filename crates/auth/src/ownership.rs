//! Existence-then-ownership guard for owned resources.
//!
//! The lookup happens strictly before the ownership check, so a caller probing
//! an unknown id gets `NotFound` while probing someone else's id gets
//! `Forbidden`. Callers can therefore learn which ids exist; this is accepted.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stockroom_core::AccountId;

use crate::authorize::{AuthzError, authorize_owner};

/// A record that belongs to exactly one account.
pub trait OwnedResource {
    fn owner(&self) -> AccountId;
}

/// Read port used by the guard to fetch a resource by id.
#[async_trait]
pub trait ResourceLookup: Send + Sync {
    type Id: Send + Sync + core::fmt::Display;
    type Resource: OwnedResource + Send;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Resource>, Self::Error>;
}

#[async_trait]
impl<L> ResourceLookup for Arc<L>
where
    L: ResourceLookup + ?Sized,
{
    type Id = L::Id;
    type Resource = L::Resource;
    type Error = L::Error;

    async fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Resource>, Self::Error> {
        (**self).find_by_id(id).await
    }
}

#[derive(Debug, Error)]
pub enum OwnershipError<E> {
    #[error("resource not found")]
    NotFound,

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error("resource lookup failed: {0}")]
    Store(#[source] E),
}

/// Enforces existence + ownership before handing out a resource.
#[derive(Debug, Clone)]
pub struct OwnershipGuard<L> {
    lookup: L,
}

impl<L> OwnershipGuard<L>
where
    L: ResourceLookup,
{
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    /// Fetch `id` and return it only if `caller` owns it.
    pub async fn authorize(
        &self,
        id: &L::Id,
        caller: AccountId,
    ) -> Result<L::Resource, OwnershipError<L::Error>> {
        let resource = self
            .lookup
            .find_by_id(id)
            .await
            .map_err(OwnershipError::Store)?
            .ok_or(OwnershipError::NotFound)?;

        if let Err(e) = authorize_owner(&resource, caller) {
            tracing::info!(resource_id = %id, caller = %caller, "ownership check denied access");
            return Err(e.into());
        }

        Ok(resource)
    }
}
