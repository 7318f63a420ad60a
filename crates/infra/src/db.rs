//! Database adapters: connection pool and schema bootstrap.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::instrument;

/// Idempotent schema statements, applied in order at startup.
const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        price DOUBLE PRECISION NOT NULL CHECK (price >= 0),
        user_created UUID NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS products_owner_created_idx
        ON products (user_created, created_at)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS products_owner_price_idx
        ON products (user_created, price)
    "#,
];

const MAX_CONNECTIONS: u32 = 10;

#[instrument(skip(database_url), err)]
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
}

/// Create tables and indexes if they do not exist yet.
#[instrument(skip(pool), err)]
pub async fn bootstrap(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("database schema ready");
    Ok(())
}
