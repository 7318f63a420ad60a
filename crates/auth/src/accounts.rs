//! Registration and login orchestration.
//!
//! Thin, but the ordering here is observable: field checks run in a fixed
//! order, and login never tells "no such account" apart from "wrong password".

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use stockroom_core::{AccountId, FieldViolation, ValidationErrors};

use crate::account::{Account, AccountStore, AccountStoreError, PublicProfile};
use crate::password::{PasswordError, PasswordHasher};
use crate::token::{TokenError, TokenService};

const PASSWORD_MAX_CHARS: usize = 100;

/// Well-formed Argon2id digest that no password is expected to match.
///
/// Unknown accounts are verified against it so both login failure paths do
/// the same amount of work.
const DECOY_DIGEST: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Registration {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl core::fmt::Debug for Registration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Login form: `username` carries the account email.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl core::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
}

impl AccessToken {
    pub fn bearer(token: String) -> Self {
        Self {
            access_token: token,
            token_type: "bearer",
        }
    }
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("email already registered")]
    DuplicateIdentity,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Hashing(#[from] PasswordError),

    #[error(transparent)]
    Store(AccountStoreError),

    #[error("blocking task failed: {0}")]
    Task(String),
}

impl From<AccountStoreError> for AccountError {
    fn from(value: AccountStoreError) -> Self {
        match value {
            AccountStoreError::DuplicateEmail => Self::DuplicateIdentity,
            other => Self::Store(other),
        }
    }
}

impl From<tokio::task::JoinError> for AccountError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Task(value.to_string())
    }
}

/// Registers accounts and exchanges credentials for access tokens.
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn AccountStore>,
    hasher: Arc<PasswordHasher>,
    tokens: Arc<TokenService>,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn AccountStore>,
        hasher: Arc<PasswordHasher>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    pub async fn register(&self, input: Registration) -> Result<PublicProfile, AccountError> {
        let (email, password) = validate_registration(input)?;

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AccountError::DuplicateIdentity);
        }

        let hasher = self.hasher.clone();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

        let account = Account {
            id: AccountId::new(),
            email,
            password_hash,
            created_at: Utc::now(),
        };
        let profile = account.profile();
        // A concurrent registration may win the unique key; that is still a duplicate.
        self.store.insert(account).await?;

        tracing::info!(account_id = %profile.id, "account registered");
        Ok(profile)
    }

    pub async fn login(&self, form: LoginForm) -> Result<AccessToken, AccountError> {
        let (username, password) = validate_login(form)?;

        let account = self.store.find_by_email(&username).await?;
        let digest = account
            .as_ref()
            .map(|a| a.password_hash.clone())
            .unwrap_or_else(|| DECOY_DIGEST.to_string());

        let hasher = self.hasher.clone();
        let verified =
            tokio::task::spawn_blocking(move || hasher.verify(&password, &digest)).await?;

        let account = match account {
            Some(account) if verified => account,
            _ => {
                tracing::info!("login rejected");
                return Err(AccountError::InvalidCredentials);
            }
        };

        let mut claims = Map::new();
        claims.insert("email".into(), Value::String(account.email.clone()));
        let token = self.tokens.issue(account.id, claims, None)?;

        tracing::info!(account_id = %account.id, "login succeeded");
        Ok(AccessToken::bearer(token))
    }

    /// Public profile of `id`, or `None` if the account no longer exists.
    pub async fn profile(&self, id: AccountId) -> Result<Option<PublicProfile>, AccountError> {
        Ok(self.store.find_by_id(id).await?.map(|a| a.profile()))
    }

    pub async fn ping(&self) -> Result<(), AccountStoreError> {
        self.store.ping().await
    }
}

fn validate_registration(input: Registration) -> Result<(String, String), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let email = match input.email {
        None => {
            errors.push(FieldViolation::required("email"));
            None
        }
        Some(email) if !is_well_formed_email(&email) => {
            errors.push(FieldViolation::invalid("email", "value is not a valid email address"));
            None
        }
        Some(email) => Some(email),
    };

    let password = match input.password {
        None => {
            errors.push(FieldViolation::required("password"));
            None
        }
        Some(p) if p.is_empty() => {
            errors.push(FieldViolation::too_short("password", 1));
            None
        }
        Some(p) if p.chars().count() > PASSWORD_MAX_CHARS => {
            errors.push(FieldViolation::too_long("password", PASSWORD_MAX_CHARS));
            None
        }
        Some(p) => Some(p),
    };

    match (email, password) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(errors),
    }
}

/// Fixed order: username missing, username empty, password missing, password empty.
fn validate_login(form: LoginForm) -> Result<(String, String), ValidationErrors> {
    let username = match form.username {
        None => return Err(FieldViolation::required("username").into()),
        Some(u) if u.is_empty() => return Err(FieldViolation::too_short("username", 1).into()),
        Some(u) => u,
    };
    let password = match form.password {
        None => return Err(FieldViolation::required("password").into()),
        Some(p) if p.is_empty() => return Err(FieldViolation::too_short("password", 1).into()),
        Some(p) => p,
    };
    Ok((username, password))
}

fn is_well_formed_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| !label.is_empty())
}
