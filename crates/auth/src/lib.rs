//! `stockroom-auth` — credential and authorization core.
//!
//! This crate is intentionally decoupled from HTTP and storage: stores are
//! reached through the [`AccountStore`] and [`ResourceLookup`] ports.

pub mod account;
pub mod accounts;
pub mod authorize;
pub mod claims;
pub mod identity;
pub mod ownership;
pub mod password;
pub mod token;

pub use account::{Account, AccountStore, AccountStoreError, PublicProfile};
pub use accounts::{AccessToken, AccountError, Authenticator, LoginForm, Registration};
pub use authorize::{AuthzError, authorize_owner};
pub use claims::{AccessClaims, TokenValidationError, validate_claims, validate_window};
pub use identity::IdentityResolver;
pub use ownership::{OwnedResource, OwnershipError, OwnershipGuard, ResourceLookup};
pub use password::{PasswordError, PasswordHasher};
pub use token::{TokenError, TokenService, TokenValidator};
