//! In-memory fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use redis::{Arg, Cmd, Value};
use uuid::Uuid;

use domain::{Category, Product};
use storefront_harness::config::DatabaseConfig;
use storefront_harness::errors::{AppError, AppResult};
use storefront_harness::infra::cache::{CacheConnection, CacheConnector, CacheError, CacheResult};
use storefront_harness::infra::db::{CatalogStore, StoreConnector, Table};

// ---------------------------------------------------------------------------
// Relational store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tables {
    categories: Vec<Category>,
    products: Vec<Product>,
    /// Row counts of tables the seed never writes
    other: HashMap<Table, u64>,
}

impl Tables {
    fn count(&self, table: Table) -> u64 {
        match table {
            Table::Categories => self.categories.len() as u64,
            Table::Products => self.products.len() as u64,
            other => self.other.get(&other).copied().unwrap_or(0),
        }
    }
}

/// Shared in-memory database enforcing `ON DELETE RESTRICT`.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<Mutex<Tables>>,
    connects: Arc<AtomicUsize>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `rows` placeholder rows into a table the seed does not manage.
    pub fn insert_rows(&self, table: Table, rows: u64) {
        *self.tables.lock().unwrap().other.entry(table).or_default() += rows;
    }

    pub fn count(&self, table: Table) -> u64 {
        self.tables.lock().unwrap().count(table)
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

/// One connection to an [`InMemoryDatabase`].
pub struct InMemoryStore {
    db: InMemoryDatabase,
    closed: AtomicBool,
}

impl InMemoryStore {
    fn tables(&self) -> AppResult<std::sync::MutexGuard<'_, Tables>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(AppError::invalid_state("connection closed"));
        }
        Ok(self.db.tables.lock().unwrap())
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn delete_all(&self, table: Table) -> AppResult<u64> {
        let mut tables = self.tables()?;

        for child in Table::RESET_ORDER {
            if child.references().contains(&table) && tables.count(child) > 0 {
                return Err(AppError::from(sea_orm::DbErr::Custom(format!(
                    "delete on {} violates foreign key from {}",
                    table, child
                ))));
            }
        }

        let removed = tables.count(table);
        match table {
            Table::Categories => tables.categories.clear(),
            Table::Products => tables.products.clear(),
            other => {
                tables.other.remove(&other);
            }
        }
        Ok(removed)
    }

    async fn insert_categories(&self, categories: Vec<Category>) -> AppResult<u64> {
        let mut tables = self.tables()?;
        let count = categories.len() as u64;
        tables.categories.extend(categories);
        Ok(count)
    }

    async fn insert_products(&self, products: Vec<Product>) -> AppResult<u64> {
        let mut tables = self.tables()?;
        for product in &products {
            if !tables.categories.iter().any(|c| c.id == product.category_id) {
                return Err(AppError::from(sea_orm::DbErr::Custom(format!(
                    "product {} references missing category {}",
                    product.slug, product.category_id
                ))));
            }
        }
        let count = products.len() as u64;
        tables.products.extend(products);
        Ok(count)
    }

    async fn count(&self, table: Table) -> AppResult<u64> {
        Ok(self.tables()?.count(table))
    }

    async fn find_product_by_slug(&self, slug: &str) -> AppResult<Option<Product>> {
        Ok(self
            .tables()?
            .products
            .iter()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn find_category(&self, id: Uuid) -> AppResult<Option<Category>> {
        Ok(self
            .tables()?
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn ping(&self) -> AppResult<()> {
        self.tables().map(|_| ())
    }

    async fn close(&self) -> AppResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl StoreConnector for InMemoryDatabase {
    async fn connect(&self, _config: &DatabaseConfig) -> AppResult<Arc<dyn CatalogStore>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(InMemoryStore {
            db: self.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

// ---------------------------------------------------------------------------
// Cache server
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Server {
    reachable: AtomicBool,
    drop_next: AtomicBool,
    stall_next: Mutex<Option<Duration>>,
    connects: AtomicUsize,
    executed: Mutex<Vec<String>>,
    data: Mutex<HashMap<String, String>>,
}

/// Scriptable in-memory cache server.
#[derive(Clone)]
pub struct FakeCacheServer {
    server: Arc<Server>,
}

impl FakeCacheServer {
    pub fn reachable() -> Self {
        let server = Self {
            server: Arc::new(Server::default()),
        };
        server.set_reachable(true);
        server
    }

    pub fn unreachable() -> Self {
        Self {
            server: Arc::new(Server::default()),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.server.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Drop the connection while running the next non-PING command.
    pub fn drop_next_command(&self) {
        self.server.drop_next.store(true, Ordering::SeqCst);
    }

    /// Apply the next non-PING command but hold its reply back for `delay`.
    pub fn stall_next_reply(&self, delay: Duration) {
        *self.server.stall_next.lock().unwrap() = Some(delay);
    }

    /// Successful connections so far
    pub fn connects(&self) -> usize {
        self.server.connects.load(Ordering::SeqCst)
    }

    /// Executed commands other than PING, rendered as space-separated args.
    pub fn executed(&self) -> Vec<String> {
        self.server
            .executed
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() != "PING")
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CacheConnector for FakeCacheServer {
    async fn connect(&self) -> CacheResult<Box<dyn CacheConnection>> {
        if !self.server.reachable.load(Ordering::SeqCst) {
            return Err(CacheError::Connection("connection refused".to_string()));
        }
        self.server.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeConnection {
            server: self.server.clone(),
        }))
    }
}

struct FakeConnection {
    server: Arc<Server>,
}

fn render(cmd: &Cmd) -> Vec<String> {
    cmd.args_iter()
        .filter_map(|arg| match arg {
            Arg::Simple(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            Arg::Cursor => None,
        })
        .collect()
}

#[async_trait]
impl CacheConnection for FakeConnection {
    async fn execute(&mut self, cmd: &Cmd) -> CacheResult<Value> {
        let args = render(cmd);
        let Some((name, rest)) = args.split_first() else {
            return Err(CacheError::Command("ERR empty command".to_string()));
        };

        if !self.server.reachable.load(Ordering::SeqCst) {
            return Err(CacheError::Connection("broken pipe".to_string()));
        }
        if name != "PING" && self.server.drop_next.swap(false, Ordering::SeqCst) {
            return Err(CacheError::Connection("connection reset by peer".to_string()));
        }

        self.server.executed.lock().unwrap().push(args.join(" "));
        let reply = self.server.apply(name, rest);

        let stall = match name.as_str() {
            "PING" => None,
            _ => self.server.stall_next.lock().unwrap().take(),
        };
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }
        reply
    }
}

impl Server {
    fn apply(&self, name: &str, rest: &[String]) -> CacheResult<Value> {
        let mut data = self.data.lock().unwrap();

        match (name, rest) {
            ("PING", _) => Ok(Value::SimpleString("PONG".to_string())),
            ("QUIT", _) => Ok(Value::Okay),
            ("SET", [key, value, ..]) => {
                data.insert(key.clone(), value.clone());
                Ok(Value::Okay)
            }
            ("GET", [key]) => Ok(data
                .get(key)
                .map(|v| Value::BulkString(v.clone().into_bytes()))
                .unwrap_or(Value::Nil)),
            ("DEL", [key]) => Ok(Value::Int(i64::from(data.remove(key).is_some()))),
            ("INCR", [key]) => {
                let current = match data.get(key) {
                    Some(v) => v.parse::<i64>().map_err(|_| {
                        CacheError::Command("ERR value is not an integer".to_string())
                    })?,
                    None => 0,
                };
                data.insert(key.clone(), (current + 1).to_string());
                Ok(Value::Int(current + 1))
            }
            _ => Err(CacheError::Command(format!("ERR unknown command '{}'", name))),
        }
    }
}
