//! Signed, time-bound bearer tokens (JWT, HS256).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use thiserror::Error;

use stockroom_core::AccountId;

use crate::claims::{AccessClaims, TokenValidationError, validate_window};

/// Claim keys owned by the token service; callers cannot override them.
const RESERVED_CLAIMS: [&str; 3] = ["sub", "iat", "exp"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("no bearer credentials presented")]
    MissingCredentials,

    #[error("token is malformed")]
    Malformed,

    #[error("token signature or algorithm rejected")]
    BadSignature,

    #[error("token subject claim is missing")]
    MissingSubject,

    #[error("token subject is not a valid account id")]
    InvalidSubject,

    #[error(transparent)]
    Window(#[from] TokenValidationError),

    #[error("token ttl must be at least one second")]
    InvalidTtl,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Verification seam used by request-facing code.
pub trait TokenValidator: Send + Sync {
    /// Verify signature, algorithm and time window at `now`.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, TokenError>;
}

/// Issues and validates HS256 access tokens with a server-held secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &Self::ALGORITHM)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub const ALGORITHM: Algorithm = Algorithm::HS256;

    pub fn hs256(secret: &[u8], default_ttl: Duration) -> Self {
        let mut validation = Validation::new(Self::ALGORITHM);
        // Time window is checked by `validate_window` against an explicit clock.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Issue a token for `subject`, expiring after `ttl` (or the default ttl).
    pub fn issue(
        &self,
        subject: AccountId,
        claims: Map<String, Value>,
        ttl: Option<Duration>,
    ) -> Result<String, TokenError> {
        self.issue_at(subject, claims, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: AccountId,
        mut claims: Map<String, Value>,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        if ttl < Duration::seconds(1) {
            return Err(TokenError::InvalidTtl);
        }

        for key in RESERVED_CLAIMS {
            claims.remove(key);
        }
        claims.insert("sub".into(), Value::String(subject.to_string()));
        claims.insert("iat".into(), Value::from(now.timestamp()));
        let expires_at = now.checked_add_signed(ttl).ok_or(TokenError::InvalidTtl)?;
        claims.insert("exp".into(), Value::from(expires_at.timestamp()));

        jsonwebtoken::encode(&Header::new(Self::ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Validate a token and return its subject.
    pub fn validate(&self, token: &str) -> Result<AccountId, TokenError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<AccountId, TokenError> {
        self.verify(token, now).map(|claims| claims.sub)
    }

    /// Signature-checked claims plus the parsed time window.
    fn decode(&self, token: &str) -> Result<DecodedToken, TokenError> {
        let data = jsonwebtoken::decode::<Map<String, Value>>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName
                | ErrorKind::InvalidKeyFormat => TokenError::BadSignature,
                _ => TokenError::Malformed,
            })?;
        let mut claims = data.claims;

        let expires_at = claims
            .remove("exp")
            .as_ref()
            .and_then(Value::as_i64)
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .ok_or(TokenError::Malformed)?;

        let issued_at = match claims.remove("iat") {
            None => None,
            Some(v) => Some(
                v.as_i64()
                    .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
                    .ok_or(TokenError::Malformed)?,
            ),
        };

        Ok(DecodedToken {
            claims,
            issued_at,
            expires_at,
        })
    }
}

struct DecodedToken {
    claims: Map<String, Value>,
    issued_at: Option<DateTime<Utc>>,
    expires_at: DateTime<Utc>,
}

/// An absent and a `null` subject are the same failure.
fn take_subject(claims: &mut Map<String, Value>) -> Result<AccountId, TokenError> {
    match claims.remove("sub") {
        None | Some(Value::Null) => Err(TokenError::MissingSubject),
        Some(Value::String(s)) => s.parse::<AccountId>().map_err(|_| TokenError::InvalidSubject),
        Some(_) => Err(TokenError::InvalidSubject),
    }
}

impl TokenValidator for TokenService {
    /// The time window is checked before the subject, so an expired token is
    /// reported as expired whatever its payload.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, TokenError> {
        let DecodedToken {
            mut claims,
            issued_at,
            expires_at,
        } = self.decode(token)?;
        validate_window(issued_at, expires_at, now)?;

        Ok(AccessClaims {
            sub: take_subject(&mut claims)?,
            issued_at,
            expires_at,
            extra: claims,
        })
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    use super::*;

    const SECRET: &[u8] = b"test-secret";

    fn service() -> TokenService {
        TokenService::hs256(SECRET, Duration::minutes(30))
    }

    fn forge(alg: Algorithm, secret: &[u8], claims: Value) -> String {
        jsonwebtoken::encode(&Header::new(alg), &claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    #[test]
    fn issued_token_validates_to_its_subject() {
        let svc = service();
        let subject = AccountId::new();
        let token = svc.issue(subject, Map::new(), None).unwrap();
        assert_eq!(svc.validate(&token), Ok(subject));
    }

    #[test]
    fn token_expires_after_ttl() {
        let svc = service();
        let subject = AccountId::new();
        let t0 = Utc::now();
        let token = svc
            .issue_at(subject, Map::new(), Some(Duration::minutes(5)), t0)
            .unwrap();

        assert_eq!(svc.validate_at(&token, t0 + Duration::minutes(4)), Ok(subject));
        assert_eq!(
            svc.validate_at(&token, t0 + Duration::minutes(5)),
            Err(TokenError::Window(TokenValidationError::Expired))
        );
    }

    #[test]
    fn default_ttl_applies_when_not_overridden() {
        let svc = service();
        let t0 = Utc::now();
        let token = svc.issue_at(AccountId::new(), Map::new(), None, t0).unwrap();
        let claims = svc.verify(&token, t0).unwrap();
        assert_eq!(claims.expires_at.timestamp(), (t0 + Duration::minutes(30)).timestamp());
        assert_eq!(claims.issued_at.map(|t| t.timestamp()), Some(t0.timestamp()));
    }

    #[test]
    fn non_positive_ttl_is_rejected() {
        let svc = service();
        assert_eq!(
            svc.issue(AccountId::new(), Map::new(), Some(Duration::zero())),
            Err(TokenError::InvalidTtl)
        );
    }

    #[test]
    fn extra_claims_are_merged_but_cannot_override_reserved_keys() {
        let svc = service();
        let subject = AccountId::new();
        let mut extra = Map::new();
        extra.insert("email".into(), json!("alice@example.com"));
        extra.insert("sub".into(), json!("someone-else"));
        extra.insert("exp".into(), json!(i64::MAX));

        let t0 = Utc::now();
        let token = svc.issue_at(subject, extra, Some(Duration::minutes(1)), t0).unwrap();
        let claims = svc.verify(&token, t0).unwrap();

        assert_eq!(claims.sub, subject);
        assert_eq!(claims.email(), Some("alice@example.com"));
        assert_eq!(claims.expires_at.timestamp(), (t0 + Duration::minutes(1)).timestamp());
    }

    #[test]
    fn different_secret_is_rejected() {
        let issuer = TokenService::hs256(b"other-secret", Duration::minutes(30));
        let token = issuer.issue(AccountId::new(), Map::new(), None).unwrap();
        assert_eq!(service().validate(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn different_algorithm_is_rejected() {
        let exp = (Utc::now() + Duration::minutes(5)).timestamp();
        let token = forge(
            Algorithm::HS512,
            SECRET,
            json!({ "sub": AccountId::new().to_string(), "exp": exp }),
        );
        assert_eq!(service().validate(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn malformed_strings_are_rejected() {
        let svc = service();
        for token in ["", "invalid_token", "a.b.c", "eyJhbGciOiJIUzI1NiJ9..."] {
            assert!(svc.validate(token).is_err(), "accepted {token:?}");
        }
        assert_eq!(svc.validate("invalid_token"), Err(TokenError::Malformed));
    }

    #[test]
    fn missing_subject_is_rejected() {
        let exp = (Utc::now() + Duration::minutes(5)).timestamp();
        let token = forge(Algorithm::HS256, SECRET, json!({ "exp": exp }));
        assert_eq!(service().validate(&token), Err(TokenError::MissingSubject));
    }

    #[test]
    fn null_subject_counts_as_missing() {
        let exp = (Utc::now() + Duration::minutes(5)).timestamp();
        let token = forge(Algorithm::HS256, SECRET, json!({ "sub": null, "exp": exp }));
        assert_eq!(service().validate(&token), Err(TokenError::MissingSubject));
    }

    #[test]
    fn expiry_is_checked_before_the_subject() {
        let exp = (Utc::now() - Duration::minutes(5)).timestamp();
        let token = forge(Algorithm::HS256, SECRET, json!({ "exp": exp }));
        assert_eq!(
            service().validate(&token),
            Err(TokenError::Window(TokenValidationError::Expired))
        );
    }

    #[test]
    fn ttl_past_the_representable_range_is_rejected() {
        let svc = service();
        assert_eq!(
            svc.issue(AccountId::new(), Map::new(), Some(Duration::MAX)),
            Err(TokenError::InvalidTtl)
        );
    }

    #[test]
    fn non_account_subject_is_rejected() {
        let exp = (Utc::now() + Duration::minutes(5)).timestamp();
        let token = forge(Algorithm::HS256, SECRET, json!({ "sub": "test_user_id", "exp": exp }));
        assert_eq!(service().validate(&token), Err(TokenError::InvalidSubject));
    }

    #[test]
    fn token_without_expiry_is_rejected() {
        let token = forge(
            Algorithm::HS256,
            SECRET,
            json!({ "sub": AccountId::new().to_string() }),
        );
        assert_eq!(service().validate(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn debug_output_hides_keys() {
        let rendered = format!("{:?}", service());
        assert!(!rendered.contains("test-secret"));
    }

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #![proptest_config(ProptestConfig { cases: 64, ..ProptestConfig::default() })]

            /// Property: any subject and positive ttl round-trips until expiry.
            #[test]
            fn subject_round_trips_until_expiry(ttl_secs in 1i64..=86_400, bytes in any::<u128>()) {
                let svc = service();
                let subject = AccountId::from_uuid(uuid::Uuid::from_u128(bytes));
                let t0 = Utc::now();
                let token = svc.issue_at(subject, Map::new(), Some(Duration::seconds(ttl_secs)), t0).unwrap();

                prop_assert_eq!(svc.validate_at(&token, t0), Ok(subject));
                prop_assert!(svc.validate_at(&token, t0 + Duration::seconds(ttl_secs)).is_err());
            }
        }
    }
}
