//! Account records (credentials) and the storage port that holds them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use stockroom_core::{AccountId, Entity};

/// A registered account: identity reference plus irreversible password digest.
///
/// Created at registration and never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl core::fmt::Debug for Account {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl Account {
    pub fn profile(&self) -> PublicProfile {
        PublicProfile {
            id: self.id,
            email: self.email.clone(),
        }
    }
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// What an account looks like to the outside world (never the digest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicProfile {
    pub id: AccountId,
    pub email: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountStoreError {
    #[error("an account with this email already exists")]
    DuplicateEmail,

    #[error("account store unavailable: {0}")]
    Unavailable(String),
}

/// Storage port for accounts; email is a unique key.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountStoreError>;

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountStoreError>;

    /// Insert a new account; fails with `DuplicateEmail` if the email is taken.
    async fn insert(&self, account: Account) -> Result<(), AccountStoreError>;

    /// Connectivity check used by the health endpoint.
    async fn ping(&self) -> Result<(), AccountStoreError> {
        Ok(())
    }
}
