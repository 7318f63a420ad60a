use std::sync::Arc;

use chrono::{DateTime, Utc};

use stockroom_core::AccountId;

use crate::token::{TokenError, TokenValidator};

/// Resolves the authenticated caller from a raw bearer token.
///
/// Every protected operation goes through here before touching a resource;
/// the returned id is the caller's identity for the rest of the request.
#[derive(Clone)]
pub struct IdentityResolver {
    validator: Arc<dyn TokenValidator>,
}

impl IdentityResolver {
    pub fn new(validator: Arc<dyn TokenValidator>) -> Self {
        Self { validator }
    }

    pub fn resolve(&self, bearer: &str) -> Result<AccountId, TokenError> {
        self.resolve_at(bearer, Utc::now())
    }

    pub fn resolve_at(&self, bearer: &str, now: DateTime<Utc>) -> Result<AccountId, TokenError> {
        let token = bearer.trim();
        if token.is_empty() {
            return Err(TokenError::MissingCredentials);
        }
        self.validator.verify(token, now).map(|claims| claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::Map;

    use super::*;
    use crate::claims::TokenValidationError;
    use crate::token::TokenService;

    fn setup() -> (Arc<TokenService>, IdentityResolver) {
        let tokens = Arc::new(TokenService::hs256(b"resolver-secret", Duration::minutes(30)));
        let resolver = IdentityResolver::new(tokens.clone());
        (tokens, resolver)
    }

    #[test]
    fn resolves_the_token_subject() {
        let (tokens, resolver) = setup();
        let subject = AccountId::new();
        let token = tokens.issue(subject, Map::new(), None).unwrap();

        assert_eq!(resolver.resolve(&token), Ok(subject));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let (tokens, resolver) = setup();
        let subject = AccountId::new();
        let token = tokens.issue(subject, Map::new(), None).unwrap();

        assert_eq!(resolver.resolve(&format!("  {token} ")), Ok(subject));
    }

    #[test]
    fn empty_credentials_are_rejected() {
        let (_tokens, resolver) = setup();
        assert_eq!(resolver.resolve("   "), Err(TokenError::MissingCredentials));
    }

    #[test]
    fn token_failures_propagate_unchanged() {
        let (tokens, resolver) = setup();
        let t0 = Utc::now();
        let token = tokens
            .issue_at(AccountId::new(), Map::new(), Some(Duration::seconds(10)), t0)
            .unwrap();

        assert_eq!(
            resolver.resolve_at(&token, t0 + Duration::seconds(10)),
            Err(TokenError::Window(TokenValidationError::Expired))
        );
        assert_eq!(resolver.resolve("invalid_token"), Err(TokenError::Malformed));
    }
}
