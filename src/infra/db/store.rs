//! Relational store seam used by the test-session lifecycle.
//!
//! The lifecycle only needs a fixed operation set (bulk delete, bulk insert,
//! count, lookup, ping, close), so it talks to the store through
//! [`CatalogStore`] and obtains one through [`StoreConnector`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Statement,
};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::{Category, Product};

use super::entities::{category, product, CategoryEntity, ProductEntity};
use super::Database;
use crate::config::DatabaseConfig;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Tables touched by a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    OrderItems,
    Orders,
    CartItems,
    Reviews,
    ProductVariants,
    Products,
    Categories,
    Users,
}

impl Table {
    /// Deletion order: every table comes before the tables it references.
    pub const RESET_ORDER: [Table; 8] = [
        Table::OrderItems,
        Table::Orders,
        Table::CartItems,
        Table::Reviews,
        Table::ProductVariants,
        Table::Products,
        Table::Categories,
        Table::Users,
    ];

    /// SQL table name
    pub fn name(self) -> &'static str {
        match self {
            Table::OrderItems => "order_items",
            Table::Orders => "orders",
            Table::CartItems => "cart_items",
            Table::Reviews => "reviews",
            Table::ProductVariants => "product_variants",
            Table::Products => "products",
            Table::Categories => "categories",
            Table::Users => "users",
        }
    }

    /// Tables this table holds foreign keys to.
    pub fn references(self) -> &'static [Table] {
        match self {
            Table::OrderItems => &[Table::Orders, Table::Products, Table::ProductVariants],
            Table::Orders => &[Table::Users],
            Table::CartItems => &[Table::Users, Table::Products, Table::ProductVariants],
            Table::Reviews => &[Table::Products, Table::Users],
            Table::ProductVariants => &[Table::Products],
            Table::Products => &[Table::Categories],
            Table::Categories | Table::Users => &[],
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Store operations needed to reset, seed and inspect the database.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Delete every row of `table` in one statement. Returns rows removed.
    async fn delete_all(&self, table: Table) -> AppResult<u64>;

    /// Bulk insert categories, keeping their ids.
    async fn insert_categories(&self, categories: Vec<Category>) -> AppResult<u64>;

    /// Bulk insert products, keeping their ids.
    async fn insert_products(&self, products: Vec<Product>) -> AppResult<u64>;

    /// Number of rows in `table`
    async fn count(&self, table: Table) -> AppResult<u64>;

    async fn find_product_by_slug(&self, slug: &str) -> AppResult<Option<Product>>;

    async fn find_category(&self, id: Uuid) -> AppResult<Option<Category>>;

    /// Round-trip a trivial query.
    async fn ping(&self) -> AppResult<()>;

    /// Release the underlying connection. Later calls fail.
    async fn close(&self) -> AppResult<()>;
}

/// Opens a [`CatalogStore`] for a configuration.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, config: &DatabaseConfig) -> AppResult<Arc<dyn CatalogStore>>;
}

/// PostgreSQL-backed store using SeaORM.
pub struct SeaOrmStore {
    connection: RwLock<Option<DatabaseConnection>>,
}

impl SeaOrmStore {
    pub fn new(connection: DatabaseConnection) -> Self {
        Self {
            connection: RwLock::new(Some(connection)),
        }
    }

    async fn conn(&self) -> AppResult<DatabaseConnection> {
        self.connection
            .read()
            .await
            .clone()
            .ok_or_else(|| AppError::invalid_state("store connection already closed"))
    }

    async fn execute_raw(&self, sql: String) -> AppResult<u64> {
        let conn = self.conn().await?;
        let result = conn
            .execute(Statement::from_string(conn.get_database_backend(), sql))
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CatalogStore for SeaOrmStore {
    async fn delete_all(&self, table: Table) -> AppResult<u64> {
        self.execute_raw(format!("DELETE FROM {}", table.name()))
            .await
    }

    async fn insert_categories(&self, categories: Vec<Category>) -> AppResult<u64> {
        if categories.is_empty() {
            return Ok(0);
        }
        let conn = self.conn().await?;
        let count = categories.len() as u64;
        let models: Vec<category::ActiveModel> =
            categories.iter().map(category::ActiveModel::from).collect();

        CategoryEntity::insert_many(models).exec(&conn).await?;
        Ok(count)
    }

    async fn insert_products(&self, products: Vec<Product>) -> AppResult<u64> {
        if products.is_empty() {
            return Ok(0);
        }
        let conn = self.conn().await?;
        let count = products.len() as u64;
        let models: Vec<product::ActiveModel> =
            products.iter().map(product::ActiveModel::from).collect();

        ProductEntity::insert_many(models).exec(&conn).await?;
        Ok(count)
    }

    async fn count(&self, table: Table) -> AppResult<u64> {
        let conn = self.conn().await?;
        let row = conn
            .query_one(Statement::from_string(
                conn.get_database_backend(),
                format!("SELECT COUNT(*) AS count FROM {}", table.name()),
            ))
            .await?;

        let count: i64 = match row {
            Some(row) => row.try_get("", "count")?,
            None => 0,
        };
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn find_product_by_slug(&self, slug: &str) -> AppResult<Option<Product>> {
        let conn = self.conn().await?;
        let result = ProductEntity::find()
            .filter(product::Column::Slug.eq(slug))
            .one(&conn)
            .await?;

        Ok(result.map(Product::from))
    }

    async fn find_category(&self, id: Uuid) -> AppResult<Option<Category>> {
        let conn = self.conn().await?;
        let result = CategoryEntity::find_by_id(id).one(&conn).await?;

        Ok(result.map(Category::from))
    }

    async fn ping(&self) -> AppResult<()> {
        self.execute_raw("SELECT 1".to_string()).await?;
        Ok(())
    }

    async fn close(&self) -> AppResult<()> {
        let connection = self.connection.write().await.take();
        match connection {
            Some(connection) => connection.close().await.map_err(AppError::from),
            None => Ok(()),
        }
    }
}

/// Connector that opens a SeaORM connection and applies migrations.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeaOrmConnector;

#[async_trait]
impl StoreConnector for SeaOrmConnector {
    async fn connect(&self, config: &DatabaseConfig) -> AppResult<Arc<dyn CatalogStore>> {
        let db = Database::connect(config).await?;
        Ok(Arc::new(SeaOrmStore::new(db.into_connection())))
    }
}
