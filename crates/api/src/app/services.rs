use std::sync::Arc;

use stockroom_auth::{Authenticator, IdentityResolver, PasswordHasher, TokenService};
use stockroom_infra::{Settings, Stores};
use stockroom_products::Catalog;

/// Everything a handler needs, shared behind one `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub accounts: Authenticator,
    pub catalog: Catalog,
    pub identity: IdentityResolver,
    pub project_name: String,
    pub version: String,
}

impl AppServices {
    pub fn new(settings: &Settings, stores: Stores) -> Self {
        if settings.uses_dev_secret() {
            tracing::warn!("tokens are signed with the insecure dev secret");
        }

        let tokens = Arc::new(TokenService::hs256(
            settings.jwt_secret.as_bytes(),
            settings.access_token_ttl,
        ));
        let accounts = Authenticator::new(
            stores.accounts,
            Arc::new(PasswordHasher::new()),
            tokens.clone(),
        );

        Self {
            accounts,
            catalog: Catalog::new(stores.products),
            identity: IdentityResolver::new(tokens),
            project_name: settings.project_name.clone(),
            version: format!("{}.0.0", settings.api_version),
        }
    }
}
