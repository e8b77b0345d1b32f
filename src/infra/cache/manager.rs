//! Cache client lifecycle management.
//!
//! [`CacheManager`] is constructed once by the composition root and handed to
//! whoever needs the cache. It lazily creates at most one live
//! [`CacheClient`] and replaces it after `close_connection`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::time::timeout;

use super::client::CacheClient;
use super::connection::{CacheConnector, RedisConnector};
use super::error::CacheResult;
use super::events::{CacheEvent, ConnectionStatus, TracingCacheListener};
use crate::config::CacheConfig;
use crate::infra::observer::{Listener, Listeners};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Cache operations used by the test harness and the CLI.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Return the live client, creating it on first use.
    async fn get_client(&self) -> Arc<CacheClient>;

    /// Gracefully shut the live client down. No-op without one.
    async fn close_connection(&self);

    /// True only while the live client is ready.
    fn is_connected(&self) -> bool;

    /// PING round-trip. Never fails; `false` means unreachable.
    async fn ping(&self) -> bool;

    /// Whether caching is enabled by configuration
    fn is_enabled(&self) -> bool;
}

/// Owns the single live cache client.
pub struct CacheManager {
    config: CacheConfig,
    connector: Arc<dyn CacheConnector>,
    listeners: Listeners<CacheEvent>,
    client: Mutex<Option<Arc<CacheClient>>>,
    generation: AtomicU64,
}

impl CacheManager {
    /// Manager over a custom connector, with the tracing listener registered.
    pub fn new(config: CacheConfig, connector: Arc<dyn CacheConnector>) -> Self {
        let mut listeners = Listeners::new();
        listeners.register(Arc::new(TracingCacheListener));

        Self {
            config,
            connector,
            listeners,
            client: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Manager backed by Redis at the configured address.
    pub fn from_config(config: &CacheConfig) -> CacheResult<Self> {
        let connector = RedisConnector::new(&config.url, config.connect_timeout())?;
        Ok(Self::new(config.clone(), Arc::new(connector)))
    }

    /// Observe transitions of every client created from now on.
    pub fn subscribe(&mut self, listener: Arc<dyn Listener<CacheEvent>>) {
        self.listeners.register(listener);
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Status of the live client, `Uninitialized` when there is none.
    pub fn status(&self) -> ConnectionStatus {
        self.lock_client()
            .as_ref()
            .map(|client| client.status())
            .unwrap_or(ConnectionStatus::Uninitialized)
    }

    fn lock_client(&self) -> MutexGuard<'_, Option<Arc<CacheClient>>> {
        self.client.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CacheService for CacheManager {
    async fn get_client(&self) -> Arc<CacheClient> {
        let mut slot = self.lock_client();
        if let Some(client) = slot.as_ref() {
            if !client.is_closed() {
                return client.clone();
            }
        }

        let id = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(client = id, "Creating cache client");
        let client = Arc::new(CacheClient::connect(
            id,
            self.config.clone(),
            self.connector.clone(),
            self.listeners.clone(),
        ));
        *slot = Some(client.clone());
        client
    }

    async fn close_connection(&self) {
        let client = self.lock_client().take();
        let Some(client) = client else {
            return;
        };

        client.shutdown().await;
        tracing::info!(client = client.id(), "Cache connection closed");
    }

    fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Ready
    }

    async fn ping(&self) -> bool {
        let client = self.get_client().await;

        match timeout(self.config.ping_window(), client.ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Cache ping failed");
                false
            }
            Err(_) => {
                tracing::warn!(
                    window_ms = self.config.ping_window().as_millis() as u64,
                    "Cache ping timed out"
                );
                false
            }
        }
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}
