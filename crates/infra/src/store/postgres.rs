//! Postgres-backed product store implementation.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Constraint` | Duplicate primary key (only with hand-inserted ids) |
//! | Database (check constraint violation) | `23514` | `Constraint` | Unknown category text |
//! | Database (string too long) | `22001` | `Constraint` | Name/description wider than the column |
//! | Database (numeric out of range) | `22003` | `Constraint` | Price wider than `NUMERIC(14, 2)` |
//! | Database (other) | Any other | `Database` | Other database errors |
//! | PoolClosed | N/A | `Database` | Connection pool was closed |
//! | Other | N/A | `Database` | Network errors, connection failures, etc. |
//!
//! ## Thread Safety
//!
//! `PostgresProductStore` is `Send + Sync` and can be shared across threads.
//! All operations go through the SQLx connection pool.

use std::future::Future;
use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};
use tokio::runtime::RuntimeFlavor;
use tracing::{instrument, Span};

use storefront_core::ProductId;
use storefront_products::{Category, Product};

use super::r#trait::{require_id, IntoPrice, ProductStore, StoreError};
use crate::config::StoreConfig;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        description VARCHAR(250) NOT NULL DEFAULT '',
        price NUMERIC(14, 2) NOT NULL,
        available BOOLEAN NOT NULL DEFAULT TRUE,
        category TEXT NOT NULL DEFAULT 'UNKNOWN'
            CHECK (category IN ('UNKNOWN', 'CLOTHS', 'FOOD', 'HOUSEWARES', 'AUTOMOTIVE', 'TOOLS'))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS products_name_idx ON products (name)",
    "CREATE INDEX IF NOT EXISTS products_category_idx ON products (category)",
];

const SELECT_COLUMNS: &str = "SELECT id, name, description, price, available, category FROM products";

/// Postgres-backed product store.
///
/// Each write runs in its own transaction, so a failed statement leaves no
/// partial row behind.
///
/// The async inherent methods are the primary API. The [`ProductStore`] impl
/// blocks on them and therefore must be called from inside a multi-threaded
/// tokio runtime.
#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    pool: Arc<PgPool>,
}

impl PostgresProductStore {
    /// Create a new PostgresProductStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a connection pool from configuration.
    #[instrument(skip(config), fields(max_connections = config.max_connections), err)]
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the `products` table and its indexes if they do not exist.
    #[instrument(skip(self), err)]
    pub async fn init_db(&self) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("init_db", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        tracing::info!("products schema ready");
        Ok(())
    }

    /// Insert a new row and write the assigned id back into `product`.
    #[instrument(skip(self, product), fields(name = %product.name, product_id = tracing::field::Empty), err)]
    pub async fn create(&self, product: &mut Product) -> Result<ProductId, StoreError> {
        product.validate()?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query(
            r#"
            INSERT INTO products (name, description, price, available, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.available)
        .bind(product.category.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| StoreError::Database(format!("failed to read assigned id: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        let id = ProductId::from_i64(id);
        product.id = Some(id);
        Span::current().record("product_id", id.as_i64());
        Ok(id)
    }

    #[instrument(skip(self, id), fields(product_id = %id), err)]
    pub async fn find(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_product", e))?;

        row.map(|r| decode(&r)).transpose()
    }

    /// Overwrite every mutable column of an existing row.
    #[instrument(skip(self, product), fields(product_id = ?product.id), err)]
    pub async fn update(&self, product: &Product) -> Result<(), StoreError> {
        let id = require_id(product, "update")?;
        product.validate()?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2,
                description = $3,
                price = $4,
                available = $5,
                category = $6
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.available)
        .bind(product.category.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::NotFound(id));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self, product), fields(product_id = ?product.id, removed = tracing::field::Empty), err)]
    pub async fn delete(&self, product: &Product) -> Result<(), StoreError> {
        let id = require_id(product, "delete")?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Span::current().record("removed", result.rows_affected());
        Ok(())
    }

    #[instrument(skip(self), fields(row_count = tracing::field::Empty), err)]
    pub async fn all(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY id"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;
        decode_all(rows)
    }

    #[instrument(skip(self), fields(row_count = tracing::field::Empty), err)]
    pub async fn find_by_name(&self, name: &str) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} WHERE name = $1 ORDER BY id"))
            .bind(name)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_name", e))?;
        decode_all(rows)
    }

    #[instrument(skip(self), fields(row_count = tracing::field::Empty), err)]
    pub async fn find_by_availability(&self, available: bool) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} WHERE available = $1 ORDER BY id"))
            .bind(available)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_availability", e))?;
        decode_all(rows)
    }

    #[instrument(skip(self, category), fields(category = %category, row_count = tracing::field::Empty), err)]
    pub async fn find_by_category(&self, category: Category) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} WHERE category = $1 ORDER BY id"))
            .bind(category.as_str())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_category", e))?;
        decode_all(rows)
    }

    /// Price lookup accepting a decimal or its textual form.
    pub async fn find_by_price<P: IntoPrice>(&self, price: P) -> Result<Vec<Product>, StoreError> {
        self.find_by_exact_price(price.into_price()?).await
    }

    #[instrument(skip(self, price), fields(price = %price, row_count = tracing::field::Empty), err)]
    pub async fn find_by_exact_price(&self, price: Decimal) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} WHERE price = $1 ORDER BY id"))
            .bind(price)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_price", e))?;
        decode_all(rows)
    }

    #[instrument(skip(self), err)]
    pub async fn count(&self) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM products")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_products", e))?;

        let total: i64 = row
            .try_get("total")
            .map_err(|e| StoreError::Database(format!("failed to read count: {e}")))?;
        Ok(total as usize)
    }

    #[instrument(skip(self), err)]
    pub async fn delete_all(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM products")
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_all_products", e))?;
        Ok(())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") | Some("23514") | Some("22001") | Some("22003") => {
                    StoreError::Constraint(msg)
                }
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Database(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Database(format!("sqlx error in {}: {}", operation, err)),
    }
}

// SQLx row types

#[derive(Debug)]
struct ProductRow {
    id: i64,
    name: String,
    description: String,
    price: Decimal,
    available: bool,
    category: String,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            available: row.try_get("available")?,
            category: row.try_get("category")?,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let category = row.category.parse::<Category>().map_err(|_| {
            StoreError::Database(format!("row {} has unknown category '{}'", row.id, row.category))
        })?;

        Ok(Product {
            id: Some(ProductId::from_i64(row.id)),
            name: row.name,
            description: row.description,
            price: row.price,
            available: row.available,
            category,
        })
    }
}

fn decode(row: &PgRow) -> Result<Product, StoreError> {
    let row = ProductRow::from_row(row)
        .map_err(|e| StoreError::Database(format!("failed to deserialize product row: {e}")))?;
    Product::try_from(row)
}

fn decode_all(rows: Vec<PgRow>) -> Result<Vec<Product>, StoreError> {
    let mut products = Vec::with_capacity(rows.len());
    for row in &rows {
        products.push(decode(row)?);
    }
    Span::current().record("row_count", products.len());
    Ok(products)
}

// Implement ProductStore trait

impl PostgresProductStore {
    /// Run an async operation to completion from synchronous code.
    ///
    /// Requires a multi-threaded tokio runtime: the current worker is handed
    /// over with `block_in_place` before blocking. Any other runtime flavor
    /// is reported as an error instead of panicking.
    fn block_on<F, T>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| {
            StoreError::Database(
                "PostgresProductStore requires async runtime (tokio). Ensure you're calling from within a tokio runtime context.".to_string(),
            )
        })?;

        if handle.runtime_flavor() != RuntimeFlavor::MultiThread {
            return Err(StoreError::Database(format!(
                "PostgresProductStore requires a multi-threaded tokio runtime, found {:?}",
                handle.runtime_flavor()
            )));
        }

        tokio::task::block_in_place(|| handle.block_on(fut))
    }
}

impl ProductStore for PostgresProductStore {
    fn create(&self, product: &mut Product) -> Result<ProductId, StoreError> {
        self.block_on(PostgresProductStore::create(self, product))
    }

    fn find(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.block_on(PostgresProductStore::find(self, id))
    }

    fn update(&self, product: &Product) -> Result<(), StoreError> {
        self.block_on(PostgresProductStore::update(self, product))
    }

    fn delete(&self, product: &Product) -> Result<(), StoreError> {
        self.block_on(PostgresProductStore::delete(self, product))
    }

    fn all(&self) -> Result<Vec<Product>, StoreError> {
        self.block_on(PostgresProductStore::all(self))
    }

    fn find_by_name(&self, name: &str) -> Result<Vec<Product>, StoreError> {
        self.block_on(PostgresProductStore::find_by_name(self, name))
    }

    fn find_by_availability(&self, available: bool) -> Result<Vec<Product>, StoreError> {
        self.block_on(PostgresProductStore::find_by_availability(self, available))
    }

    fn find_by_category(&self, category: Category) -> Result<Vec<Product>, StoreError> {
        self.block_on(PostgresProductStore::find_by_category(self, category))
    }

    fn find_by_exact_price(&self, price: Decimal) -> Result<Vec<Product>, StoreError> {
        self.block_on(PostgresProductStore::find_by_exact_price(self, price))
    }

    fn count(&self) -> Result<usize, StoreError> {
        self.block_on(PostgresProductStore::count(self))
    }

    fn delete_all(&self) -> Result<(), StoreError> {
        self.block_on(PostgresProductStore::delete_all(self))
    }
}
