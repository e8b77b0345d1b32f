//! Transport seam for the cache client.
//!
//! The client driver only needs "open a connection" and "run a command",
//! which keeps reconnect and queueing logic independent of the socket.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client, Cmd, Value};

use super::error::{CacheError, CacheResult};

/// An established connection able to execute commands.
#[async_trait]
pub trait CacheConnection: Send {
    async fn execute(&mut self, cmd: &Cmd) -> CacheResult<Value>;
}

/// Opens new connections to the cache backend.
#[async_trait]
pub trait CacheConnector: Send + Sync {
    async fn connect(&self) -> CacheResult<Box<dyn CacheConnection>>;
}

/// Redis connector over a multiplexed tokio connection.
#[derive(Clone)]
pub struct RedisConnector {
    client: Client,
    connect_timeout: Duration,
}

impl RedisConnector {
    /// Validate the address up front; connecting happens lazily.
    pub fn new(url: &str, connect_timeout: Duration) -> CacheResult<Self> {
        let client = Client::open(url).map_err(|e| CacheError::Config(e.to_string()))?;
        Ok(Self {
            client,
            connect_timeout,
        })
    }
}

#[async_trait]
impl CacheConnector for RedisConnector {
    async fn connect(&self) -> CacheResult<Box<dyn CacheConnection>> {
        let connection = tokio::time::timeout(
            self.connect_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| CacheError::Timeout)??;

        Ok(Box::new(RedisConnection { inner: connection }))
    }
}

struct RedisConnection {
    inner: MultiplexedConnection,
}

#[async_trait]
impl CacheConnection for RedisConnection {
    async fn execute(&mut self, cmd: &Cmd) -> CacheResult<Value> {
        let value: Value = cmd.query_async(&mut self.inner).await?;
        Ok(value)
    }
}
