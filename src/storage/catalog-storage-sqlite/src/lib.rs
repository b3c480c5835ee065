//! # Catalog Storage - SQLite Backend
//!
//! Persistent implementation of the product store.
//!
//! The table is a key-value layout: a single numeric partition key (`id`)
//! and the product's attribute document (`item`). Price ordering is not
//! delegated to the database; `list` scans the whole table and sorts in
//! memory.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::sqlite::{Sqlite, SqlitePool, SqlitePoolOptions};
use sqlx::Transaction;
use tracing::{debug, info, warn};

use catalog_storage::{
    seed_products, sort_by_price_desc, Attributes, Product, ProductId, ProductStore, StorageError,
};

/// Default database file.
pub const DEFAULT_DATABASE: &str = "data/catalog.db";

/// Default table name.
pub const DEFAULT_TABLE: &str = "Products";

/// Connection settings for [`SqliteStore`].
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database file, created if missing.
    pub database: PathBuf,
    /// Table holding the catalog (must match `[A-Za-z][A-Za-z0-9_]*`).
    pub table: String,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

/// Outcome of [`SqliteStore::bootstrap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    /// The table was already present; nothing was written.
    AlreadyExists,
    /// The table was created and seeded.
    Created {
        /// Number of demonstration products inserted.
        seeded: usize,
    },
}

/// SQLite product store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    table: String,
    database: PathBuf,
}

impl SqliteStore {
    /// Opens (or creates) the database file and connects.
    ///
    /// The table itself is not touched; call [`SqliteStore::bootstrap`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Table name is invalid
    /// - Directory cannot be created
    /// - Database connection fails
    pub async fn open(config: &SqliteConfig) -> Result<Self, StorageError> {
        Self::validate_table(&config.table)?;

        let database = config.database.clone();
        if let Some(parent) = database.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::ConnectionFailed(format!("failed to create directory: {e}"))
            })?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", database.display());

        debug!(table = %config.table, path = %database.display(), "Opening SQLite database");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            pool,
            table: config.table.clone(),
            database,
        })
    }

    /// Validates that a table name is safe to interpolate into SQL.
    fn validate_table(table: &str) -> Result<(), StorageError> {
        if table.is_empty() {
            return Err(StorageError::InvalidInput("table cannot be empty".into()));
        }

        if table.len() > 64 {
            return Err(StorageError::InvalidInput("table name too long".into()));
        }

        let mut chars = table.chars();
        let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        let valid = starts_alpha && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !valid {
            return Err(StorageError::InvalidInput(
                "table must match [A-Za-z][A-Za-z0-9_]*".into(),
            ));
        }

        Ok(())
    }

    /// Returns the catalog table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the database file path.
    pub fn database(&self) -> &Path {
        &self.database
    }

    /// Lists user tables in the database.
    pub async fn list_tables(&self) -> Result<Vec<String>, StorageError> {
        sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))
    }

    /// Checks whether a table with this name exists.
    ///
    /// SQLite identifiers are case-insensitive, so `products` finds `Products`.
    pub async fn table_exists(&self, name: &str) -> Result<bool, StorageError> {
        let tables = self.list_tables().await?;
        Ok(tables.iter().any(|t| t.eq_ignore_ascii_case(name)))
    }

    /// Ensures the catalog table exists, creating and seeding it on first run.
    ///
    /// Running this against a database that already holds the table neither
    /// recreates it nor inserts the seed set again. Creation and seeding
    /// commit together: a failed seed leaves no table behind.
    pub async fn bootstrap(&self) -> Result<Bootstrap, StorageError> {
        self.bootstrap_with(seed_products()).await
    }

    async fn bootstrap_with(&self, products: Vec<Product>) -> Result<Bootstrap, StorageError> {
        let tables = self.list_tables().await?;
        debug!(tables = ?tables, "Existing tables");

        if tables.iter().any(|t| t.eq_ignore_ascii_case(&self.table)) {
            info!(table = %self.table, "Table already exists");
            return Ok(Bootstrap::AlreadyExists);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::QueryFailed(format!("begin transaction failed: {e}")))?;

        if let Err(e) = self.create_and_seed(&mut tx, &products).await {
            if let Err(rb) = tx.rollback().await {
                warn!(table = %self.table, error = %rb, "Rollback failed");
            }
            return Err(e);
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::QueryFailed(format!("commit failed: {e}")))?;

        let seeded = products.len();
        info!(table = %self.table, seeded, "Table created");
        Ok(Bootstrap::Created { seeded })
    }

    /// Creates the catalog table and writes the seed set inside `tx`.
    async fn create_and_seed(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        products: &[Product],
    ) -> Result<(), StorageError> {
        info!(table = %self.table, "Creating table");

        let sql = format!(
            r#"CREATE TABLE "{}" (
                id   INTEGER PRIMARY KEY NOT NULL,
                item TEXT NOT NULL
            )"#,
            self.table
        );

        sqlx::query(&sql)
            .execute(&mut **tx)
            .await
            .map_err(|e| StorageError::QueryFailed(format!("create table failed: {e}")))?;

        let upsert = self.upsert_sql();
        for product in products {
            sqlx::query(&upsert)
                .bind(product.id)
                .bind(Self::encode(product)?)
                .execute(&mut **tx)
                .await
                .map_err(|e| StorageError::QueryFailed(e.to_string()))?;
        }

        debug!(count = products.len(), "Seed data entered");
        Ok(())
    }

    fn upsert_sql(&self) -> String {
        format!(
            r#"INSERT INTO "{}" (id, item) VALUES (?, ?)
               ON CONFLICT(id) DO UPDATE SET item = excluded.item"#,
            self.table
        )
    }

    /// Encodes a product as its stored item.
    ///
    /// JSON has no NaN or infinity, so non-finite prices are refused here
    /// rather than stored as `null`.
    fn encode(product: &Product) -> Result<String, StorageError> {
        if !product.price.is_finite() {
            return Err(StorageError::InvalidInput(format!(
                "product {} has a non-finite price",
                product.id
            )));
        }

        serde_json::to_string(&product.to_attributes()?)
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Writes the product under its id, replacing any existing item.
    async fn put(&self, product: &Product) -> Result<(), StorageError> {
        let item = Self::encode(product)?;

        sqlx::query(&self.upsert_sql())
            .bind(product.id)
            .bind(item)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// Decodes a stored item, checking it agrees with its key.
    fn decode(id: ProductId, item: &str) -> Result<Product, StorageError> {
        let attrs: Attributes = serde_json::from_str(item)
            .map_err(|e| StorageError::Serialization(format!("item {id}: {e}")))?;
        let product = Product::from_attributes(attrs)?;

        if product.id != id {
            return Err(StorageError::Serialization(format!(
                "item stored under key {id} carries id {}",
                product.id
            )));
        }

        Ok(product)
    }
}

#[async_trait]
impl ProductStore for SqliteStore {
    async fn list(&self) -> Result<Vec<Product>, StorageError> {
        let sql = format!(r#"SELECT id, item FROM "{}""#, self.table);

        let rows: Vec<(i64, String)> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        let mut products = rows
            .iter()
            .map(|(id, item)| Self::decode(*id, item))
            .collect::<Result<Vec<_>, _>>()?;

        sort_by_price_desc(&mut products);
        Ok(products)
    }

    async fn insert(&self, product: Product) -> Result<(), StorageError> {
        self.put(&product).await?;
        debug!(product = %product, "Product inserted");
        Ok(())
    }

    async fn get(&self, id: ProductId) -> Result<Product, StorageError> {
        let sql = format!(r#"SELECT id, item FROM "{}" WHERE id = ?"#, self.table);

        let row: Option<(i64, String)> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        match row {
            Some((key, item)) => Self::decode(key, &item),
            None => Err(StorageError::NotFound { id }),
        }
    }

    async fn update(&self, product: Product) -> Result<(), StorageError> {
        // Upsert: a missing id is created rather than reported.
        self.put(&product).await?;
        debug!(product = %product, "Product updated");
        Ok(())
    }

    async fn delete(&self, id: ProductId) -> Result<(), StorageError> {
        let sql = format!(r#"DELETE FROM "{}" WHERE id = ?"#, self.table);

        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound { id });
        }

        debug!(id, "Product deleted");
        Ok(())
    }

    async fn cleanup(&self) -> Result<(), StorageError> {
        info!(path = %self.database.display(), "Cleaning up SQLite backend");
        self.pool.close().await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
