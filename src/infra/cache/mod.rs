//! Redis cache client, its lifecycle manager and connection events.

mod client;
mod connection;
mod error;
mod events;
mod manager;

pub use client::CacheClient;
pub use connection::{CacheConnection, CacheConnector, RedisConnector};
pub use error::{CacheError, CacheResult};
pub use events::{CacheEvent, ConnectionStatus, TracingCacheListener};
pub use manager::{CacheManager, CacheService};

#[cfg(any(test, feature = "test-utils"))]
pub use manager::MockCacheService;
