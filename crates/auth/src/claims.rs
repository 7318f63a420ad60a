use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use stockroom_core::AccountId;

/// Claims of an access token whose signature has already been verified.
///
/// Registered claims (`sub`, `iat`, `exp`) are lifted into typed fields; any
/// other claim stays in `extra` untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessClaims {
    /// Subject / account identifier.
    pub sub: AccountId,

    /// Issued-at timestamp, when the token carries one.
    pub issued_at: Option<DateTime<Utc>>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,

    /// Non-registered claims (e.g. `email`).
    pub extra: Map<String, Value>,
}

impl AccessClaims {
    pub fn email(&self) -> Option<&str> {
        self.extra.get("email").and_then(Value::as_str)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Tolerated clock skew between the issuer and the validator for `iat`.
pub const ISSUED_AT_LEEWAY_SECS: i64 = 30;

/// Deterministically validate the time window of verified claims.
///
/// Expiry is strict: a token is no longer valid at the instant `now == exp`.
pub fn validate_claims(claims: &AccessClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    validate_window(claims.issued_at, claims.expires_at, now)
}

/// Window check on raw timestamps, before the rest of the payload is trusted.
pub fn validate_window(
    issued_at: Option<DateTime<Utc>>,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), TokenValidationError> {
    if let Some(issued_at) = issued_at {
        if expires_at <= issued_at {
            return Err(TokenValidationError::InvalidTimeWindow);
        }
        if now + Duration::seconds(ISSUED_AT_LEEWAY_SECS) < issued_at {
            return Err(TokenValidationError::NotYetValid);
        }
    }
    if now >= expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
