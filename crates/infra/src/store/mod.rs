//! Store adapters for the account and product ports.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use stockroom_auth::AccountStore;
use stockroom_products::ProductStore;

use crate::config::Settings;
use crate::db;

pub use in_memory::{InMemoryAccountStore, InMemoryProductStore};
pub use postgres::{PostgresAccountStore, PostgresProductStore};

/// The store handles injected into the application.
#[derive(Clone)]
pub struct Stores {
    pub accounts: Arc<dyn AccountStore>,
    pub products: Arc<dyn ProductStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            accounts: Arc::new(InMemoryAccountStore::new()),
            products: Arc::new(InMemoryProductStore::new()),
        }
    }
}

/// Postgres when `DATABASE_URL` is configured, in-memory otherwise.
pub async fn open_stores(settings: &Settings) -> Result<Stores, sqlx::Error> {
    let Some(url) = settings.database_url.as_deref() else {
        tracing::info!("DATABASE_URL not set; using in-memory stores");
        return Ok(Stores::in_memory());
    };

    let pool = db::connect(url).await?;
    db::bootstrap(&pool).await?;
    tracing::info!("using postgres stores");

    Ok(Stores {
        accounts: Arc::new(PostgresAccountStore::new(pool.clone())),
        products: Arc::new(PostgresProductStore::new(pool)),
    })
}
