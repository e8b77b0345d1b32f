//! Infrastructure layer - external systems integration
//!
//! - PostgreSQL schema, store and test-session lifecycle
//! - Redis client and its connection manager
//! - Listener registry shared by both

pub mod cache;
pub mod db;
pub mod observer;

pub use cache::{CacheClient, CacheManager, CacheService};
pub use db::{CatalogStore, Database, DatabaseLifecycle, Migrator};
pub use observer::{Listener, Listeners, RecordingListener};
