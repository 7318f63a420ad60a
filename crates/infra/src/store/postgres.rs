//! Postgres-backed account and product stores.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | Store error |
//! |------------|----------------------|-------------|
//! | Database (unique violation) | `23505` | `AccountStoreError::DuplicateEmail` (accounts only) |
//! | Database (other) | Any other | `Unavailable` |
//! | PoolClosed / Io / other | N/A | `Unavailable` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use stockroom_auth::{Account, AccountStore, AccountStoreError};
use stockroom_core::{AccountId, ProductId};
use stockroom_products::query::round_cents;
use stockroom_products::{
    Product, ProductFilter, ProductPatch, ProductStats, ProductStore, ProductStoreError,
};

const UNIQUE_VIOLATION: &str = "23505";

fn describe_sqlx_error(operation: &str, err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db_err) => {
            format!("database error in {}: {}", operation, db_err.message())
        }
        sqlx::Error::PoolClosed => format!("connection pool closed in {}", operation),
        other => format!("sqlx error in {}: {}", operation, other),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

fn account_error(operation: &str, err: sqlx::Error) -> AccountStoreError {
    if is_unique_violation(&err) {
        return AccountStoreError::DuplicateEmail;
    }
    AccountStoreError::Unavailable(describe_sqlx_error(operation, &err))
}

fn product_error(operation: &str, err: sqlx::Error) -> ProductStoreError {
    ProductStoreError::Unavailable(describe_sqlx_error(operation, &err))
}

struct AccountRow(Account);

impl<'r> sqlx::FromRow<'r, PgRow> for AccountRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(AccountRow(Account {
            id: AccountId::from_uuid(row.try_get("id")?),
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
        }))
    }
}

struct ProductRow(Product);

impl<'r> sqlx::FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow(Product {
            id: ProductId::from_uuid(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            user_created: AccountId::from_uuid(row.try_get("user_created")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct PostgresAccountStore {
    pool: Arc<PgPool>,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    #[instrument(skip(self, email), err)]
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountStoreError> {
        sqlx::query_as::<_, AccountRow>(
            "SELECT id, email, password_hash, created_at FROM accounts WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map(|row| row.map(|r| r.0))
        .map_err(|e| account_error("find_by_email", e))
    }

    #[instrument(skip(self), fields(account_id = %id), err)]
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountStoreError> {
        sqlx::query_as::<_, AccountRow>(
            "SELECT id, email, password_hash, created_at FROM accounts WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map(|row| row.map(|r| r.0))
        .map_err(|e| account_error("find_by_id", e))
    }

    #[instrument(skip(self, account), fields(account_id = %account.id), err)]
    async fn insert(&self, account: Account) -> Result<(), AccountStoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.created_at)
        .execute(&*self.pool)
        .await
        .map(|_| ())
        .map_err(|e| account_error("insert_account", e))
    }

    async fn ping(&self) -> Result<(), AccountStoreError> {
        sqlx::query("SELECT 1")
            .execute(&*self.pool)
            .await
            .map(|_| ())
            .map_err(|e| account_error("ping", e))
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, user_created, created_at, updated_at";

/// Owner + filter predicate shared by list and stats; binds `$1..=$4`.
const PRODUCT_FILTER: &str = r#"
    user_created = $1
    AND ($2::TEXT IS NULL OR name ILIKE $2 OR description ILIKE $2)
    AND ($3::FLOAT8 IS NULL OR price >= $3)
    AND ($4::FLOAT8 IS NULL OR price <= $4)
"#;

/// `%term%` with LIKE metacharacters escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn stats_from_row(row: &PgRow) -> Result<ProductStats, sqlx::Error> {
    let count: i64 = row.try_get("count")?;
    Ok(ProductStats {
        count: u64::try_from(count).unwrap_or(0),
        total_price: round_cents(row.try_get("total_price")?),
        average_price: row.try_get::<Option<f64>, _>("average_price")?.map(round_cents),
        min_price: row.try_get("min_price")?,
        max_price: row.try_get("max_price")?,
    })
}

#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    pool: Arc<PgPool>,
}

impl PostgresProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn get(&self, id: ProductId) -> Result<Option<Product>, ProductStoreError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map(|row| row.map(|r| r.0))
        .map_err(|e| product_error("get_product", e))
    }

    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn insert(&self, product: Product) -> Result<(), ProductStoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, user_created, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.user_created.as_uuid())
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&*self.pool)
        .await
        .map(|_| ())
        .map_err(|e| product_error("insert_product", e))
    }

    #[instrument(skip(self, patch), fields(product_id = %id), err)]
    async fn update(
        &self,
        id: ProductId,
        patch: &ProductPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Product>, ProductStoreError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                updated_at = $5
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(patch.price)
        .bind(now)
        .fetch_optional(&*self.pool)
        .await
        .map(|row| row.map(|r| r.0))
        .map_err(|e| product_error("update_product", e))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete(&self, id: ProductId) -> Result<bool, ProductStoreError> {
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map(|done| done.rows_affected() > 0)
            .map_err(|e| product_error("delete_product", e))
    }

    #[instrument(skip(self, filter), fields(owner = %owner), err)]
    async fn list(
        &self,
        owner: AccountId,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, ProductStoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE {PRODUCT_FILTER} ORDER BY created_at ASC, id ASC"
        ))
        .bind(owner.as_uuid())
        .bind(filter.search_term().map(like_pattern))
        .bind(filter.min_price)
        .bind(filter.max_price)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| product_error("list_products", e))?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    #[instrument(skip(self, filter), fields(owner = %owner), err)]
    async fn stats(
        &self,
        owner: AccountId,
        filter: &ProductFilter,
    ) -> Result<ProductStats, ProductStoreError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT
                COUNT(*) AS count,
                COALESCE(SUM(price), 0) AS total_price,
                AVG(price) AS average_price,
                MIN(price) AS min_price,
                MAX(price) AS max_price
            FROM products
            WHERE {PRODUCT_FILTER}
            "#
        ))
        .bind(owner.as_uuid())
        .bind(filter.search_term().map(like_pattern))
        .bind(filter.min_price)
        .bind(filter.max_price)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| product_error("product_stats", e))?;

        stats_from_row(&row).map_err(|e| product_error("product_stats", e))
    }
}
