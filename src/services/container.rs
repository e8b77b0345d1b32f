//! Service container - composition root for the harness.
//!
//! Both components are built here once and shared through `Arc`; nothing in
//! the crate reaches for a process-wide instance.

use std::sync::Arc;

use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::cache::{CacheManager, CacheService};
use crate::infra::db::{CatalogStore, DatabaseLifecycle, SeaOrmConnector, StoreConnector};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Access to the harness components.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    /// Database lifecycle controller
    fn lifecycle(&self) -> Arc<DatabaseLifecycle>;

    /// Cache connection manager
    fn cache(&self) -> Arc<dyn CacheService>;
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    lifecycle: Arc<DatabaseLifecycle>,
    cache: Arc<dyn CacheService>,
}

impl Services {
    pub fn new(lifecycle: Arc<DatabaseLifecycle>, cache: Arc<dyn CacheService>) -> Self {
        Self { lifecycle, cache }
    }

    /// Build the PostgreSQL lifecycle and the Redis manager from config.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::with_connector(config, Arc::new(SeaOrmConnector))
    }

    /// Build with a custom store connector (the cache still uses Redis).
    pub fn with_connector(config: &Config, connector: Arc<dyn StoreConnector>) -> AppResult<Self> {
        let lifecycle = Arc::new(DatabaseLifecycle::new(config.database.clone(), connector));
        let cache = Arc::new(CacheManager::from_config(&config.cache)?);

        Ok(Self::new(lifecycle, cache))
    }

    /// Session-wide setup: the database must be ready before any test runs.
    ///
    /// The cache is not touched; it connects lazily on first use.
    pub async fn global_setup(&self) -> AppResult<Arc<dyn CatalogStore>> {
        let store = self.lifecycle.set_up().await?;
        tracing::info!("Test session ready");
        Ok(store)
    }

    /// Session-wide teardown. Never fails: both components are closed even
    /// if one of them misbehaves.
    pub async fn global_teardown(&self) {
        tokio::join!(self.lifecycle.tear_down(), self.cache.close_connection());
        tracing::info!("Test session closed");
    }
}

impl ServiceContainer for Services {
    fn lifecycle(&self) -> Arc<DatabaseLifecycle> {
        self.lifecycle.clone()
    }

    fn cache(&self) -> Arc<dyn CacheService> {
        self.cache.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::errors::AppError;
    use crate::infra::cache::MockCacheService;
    use crate::infra::db::{LifecycleState, MockStoreConnector};

    fn services(connector: MockStoreConnector, cache: MockCacheService) -> Services {
        let lifecycle = DatabaseLifecycle::new(DatabaseConfig::default(), Arc::new(connector));
        Services::new(Arc::new(lifecycle), Arc::new(cache))
    }

    #[tokio::test]
    async fn test_global_setup_propagates_connect_failure() {
        let mut connector = MockStoreConnector::new();
        connector
            .expect_connect()
            .times(1)
            .returning(|_| Err(AppError::config("connection refused")));
        let cache = MockCacheService::new();

        let services = services(connector, cache);

        assert!(services.global_setup().await.is_err());
        assert_eq!(services.lifecycle().state().await, LifecycleState::Failed);
    }

    #[tokio::test]
    async fn test_global_teardown_closes_cache_without_setup() {
        let connector = MockStoreConnector::new();
        let mut cache = MockCacheService::new();
        cache.expect_close_connection().times(1).returning(|| ());

        let services = services(connector, cache);
        services.global_teardown().await;

        assert_eq!(services.lifecycle().state().await, LifecycleState::Closed);
    }
}
