use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use stockroom_auth::{IdentityResolver, TokenError};

use crate::app::errors::ApiError;
use crate::context::CallerContext;

#[derive(Clone)]
pub struct AuthState {
    pub identity: IdentityResolver,
}

/// Resolve the bearer token into a [`CallerContext`] or reject with 401.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;
    let account_id = state.identity.resolve(token)?;

    req.extensions_mut().insert(CallerContext::new(account_id));

    Ok(next.run(req).await)
}

/// Scheme match is case-insensitive (`Bearer`, `bearer`, ...).
fn extract_bearer(headers: &HeaderMap) -> Result<&str, TokenError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(TokenError::MissingCredentials)?;

    let header = header.to_str().map_err(|_| TokenError::MissingCredentials)?;

    let (scheme, token) = header
        .split_once(' ')
        .ok_or(TokenError::MissingCredentials)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(TokenError::MissingCredentials);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(TokenError::MissingCredentials);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, header::AUTHORIZATION};

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn accepts_any_scheme_case() {
        assert_eq!(extract_bearer(&headers("Bearer abc")), Ok("abc"));
        assert_eq!(extract_bearer(&headers("bearer abc")), Ok("abc"));
        assert_eq!(extract_bearer(&headers("BEARER  abc ")), Ok("abc"));
    }

    #[test]
    fn rejects_missing_or_foreign_credentials() {
        assert_eq!(extract_bearer(&HeaderMap::new()), Err(TokenError::MissingCredentials));
        for value in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer   ", "abc"] {
            assert_eq!(
                extract_bearer(&headers(value)),
                Err(TokenError::MissingCredentials),
                "{value}"
            );
        }
    }
}
